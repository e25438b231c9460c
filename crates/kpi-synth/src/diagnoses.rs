//! 固定的诊断参考表

use kpi_core::DiagnosisReference;

/// ICD风格的诊断编码与描述
pub const DIAGNOSES: [(&str, &str); 8] = [
    ("I10", "Essential (primary) hypertension"),
    ("E11", "Type 2 diabetes mellitus"),
    ("J18", "Pneumonia, unspecified organism"),
    ("I21", "Acute myocardial infarction"),
    ("N39", "Urinary tract infection"),
    ("K21", "Gastro-esophageal reflux disease"),
    ("F41", "Anxiety disorders"),
    ("M54", "Dorsalgia [back pain]"),
];

/// 诊断参考表
pub fn diagnosis_reference() -> Vec<DiagnosisReference> {
    DIAGNOSES
        .iter()
        .map(|(code, desc)| DiagnosisReference::new(code, desc))
        .collect()
}
