//! 结果合并与风险评分
use crate::findings::Finding;
use crate::types::{DataFlow, MergedFindings, RiskLevel, Summary};

/// 计入高权重的敏感权限
pub const SENSITIVE_PERMISSIONS: &[&str] = &["CAMERA", "LOCATION_FINE", "MICROPHONE", "CONTACTS_READ"];

const HIGH_RISK_THRESHOLD: f64 = 6.0;
const MEDIUM_RISK_THRESHOLD: f64 = 3.0;

const HINT_LOCATION: &str = "Location data requires explicit user consent and clear purpose explanation";
const HINT_THIRD_PARTY: &str = "Third-party services must be disclosed with their privacy policies";
const HINT_TRACKING: &str = "Tracking requires user consent and opt-out mechanisms";

/// 合并多个单文件命中
/// - 集合类别去重（跨文件重复合并为一个）
/// - `third_party_libs` 并入 `third_party_services`
/// - `scanners` 与 `dependencies` 只追加
pub fn merge_findings<'a, I>(findings: I) -> MergedFindings
where
    I: IntoIterator<Item = &'a Finding>,
{
    let mut merged = MergedFindings::default();
    for f in findings {
        merged.scanners.push(f.scanner.clone());
        merged.permissions.extend(f.permissions.iter().cloned());
        merged.apis.extend(f.apis.iter().cloned());
        merged.third_party_services.extend(f.third_party_services.iter().cloned());
        merged.third_party_services.extend(f.third_party_libs.iter().cloned());
        merged.data_collection.extend(f.data_collection.iter().cloned());
        merged.storage.extend(f.storage.iter().cloned());
        merged.tracking.extend(f.tracking.iter().cloned());
        merged.web_apis.extend(f.web_apis.iter().cloned());
        merged.dependencies.extend(f.dependencies.iter().cloned());
        if let Some(html) = &f.html_analysis {
            let assets = &mut merged.html_assets;
            assets.external_scripts.extend(html.external_scripts.iter().cloned());
            assets.meta_tags.extend(html.meta_tags.iter().cloned());
            assets.iframes.extend(html.iframes.iter().cloned());
        }
    }
    merged
}

/// riskScore = 2×敏感权限数 + 第三方服务数 + 1.5×跟踪标签数
pub fn risk_score(m: &MergedFindings) -> f64 {
    let sensitive = m.permissions.iter().filter(|p| SENSITIVE_PERMISSIONS.contains(&p.as_str())).count();
    2.0 * sensitive as f64 + m.third_party_services.len() as f64 + 1.5 * m.tracking.len() as f64
}

pub fn risk_level(score: f64) -> RiskLevel {
    if score >= HIGH_RISK_THRESHOLD {
        RiskLevel::High
    } else if score >= MEDIUM_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn has_location(m: &MergedFindings) -> bool {
    m.permissions.iter().any(|p| p.contains("LOCATION"))
}

/// 生成风险摘要
pub fn summarize(m: &MergedFindings) -> Summary {
    let score = risk_score(m);

    let mut main_features = Vec::new();
    if has_location(m) { main_features.push("Location Services".to_string()); }
    if m.permissions.contains("CAMERA") { main_features.push("Camera/Photo".to_string()); }
    if m.third_party_services.iter().any(|s| s.contains("ANALYTICS")) { main_features.push("Analytics".to_string()); }
    if !m.tracking.is_empty() { main_features.push("User Tracking".to_string()); }

    let mut compliance_hints = Vec::new();
    if has_location(m) { compliance_hints.push(HINT_LOCATION.to_string()); }
    if !m.third_party_services.is_empty() { compliance_hints.push(HINT_THIRD_PARTY.to_string()); }
    if !m.tracking.is_empty() { compliance_hints.push(HINT_TRACKING.to_string()); }

    Summary {
        privacy_risk_level: risk_level(score),
        risk_score: score,
        main_features,
        compliance_hints,
        data_flow: DataFlow {
            collects_personal_data: !m.permissions.is_empty() || !m.data_collection.is_empty(),
            shares_with_third_parties: !m.third_party_services.is_empty(),
            uses_tracking: !m.tracking.is_empty(),
            stores_locally: !m.storage.is_empty(),
        },
    }
}
