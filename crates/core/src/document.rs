//! CPF/CNPJ document-number normalization.
//!
//! Clients are identified by their document number with punctuation
//! stripped, so `123.456.789-09` and `12345678909` resolve to the same
//! record.

/// Digits in a CPF (natural person).
pub const CPF_LEN: usize = 11;

/// Digits in a CNPJ (legal entity).
pub const CNPJ_LEN: usize = 14;

/// Strip everything but digits from a document number.
pub fn normalize_document(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate that a normalized document has CPF or CNPJ length.
pub fn validate_document(normalized: &str) -> Result<(), String> {
    if normalized.len() == CPF_LEN || normalized.len() == CNPJ_LEN {
        Ok(())
    } else {
        Err(format!(
            "Document must have {CPF_LEN} (CPF) or {CNPJ_LEN} (CNPJ) digits, got {}",
            normalized.len()
        ))
    }
}
