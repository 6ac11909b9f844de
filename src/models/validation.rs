use lazy_static::lazy_static;
use regex::Regex;

use super::LigneDocument;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 5000;
pub const MAX_LIGNES: usize = 200;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid");
    static ref TELEPHONE_RE: Regex =
        Regex::new(r"^\+?[0-9][0-9 .\-]{5,19}$").expect("telephone regex is valid");
}

pub fn required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be blank"));
    }
    max_len(field, Some(value), MAX_NAME_LEN)
}

pub fn max_len(field: &str, value: Option<&str>, max: usize) -> Result<(), String> {
    match value {
        Some(value) if value.chars().count() > max => {
            Err(format!("{field} must be at most {max} characters"))
        }
        _ => Ok(()),
    }
}

pub fn email(value: Option<&str>) -> Result<(), String> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() && !EMAIL_RE.is_match(value) => {
            Err("email is not a valid address".to_string())
        }
        _ => Ok(()),
    }
}

pub fn telephone(value: Option<&str>) -> Result<(), String> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() && !TELEPHONE_RE.is_match(value) => {
            Err("telephone is not a valid phone number".to_string())
        }
        _ => Ok(()),
    }
}

pub fn priorite(value: Option<i16>) -> Result<(), String> {
    if let Some(priorite) = value
        && !(1..=5).contains(&priorite)
    {
        return Err("priorite must be between 1 and 5".to_string());
    }
    Ok(())
}

pub fn taux_tva(value: Option<u32>) -> Result<(), String> {
    if let Some(taux) = value
        && taux > 10_000
    {
        return Err("tauxTva must be expressed in basis points (0..=10000)".to_string());
    }
    Ok(())
}

pub fn lignes(lignes: &[LigneDocument]) -> Result<(), String> {
    if lignes.len() > MAX_LIGNES {
        return Err(format!("a document holds at most {MAX_LIGNES} lines"));
    }
    for (position, ligne) in lignes.iter().enumerate() {
        if ligne.designation.trim().is_empty() {
            return Err(format!("lignes[{position}].designation must not be blank"));
        }
        if ligne.quantite == 0 {
            return Err(format!("lignes[{position}].quantite must be positive"));
        }
        if ligne.prix_unitaire < 0 {
            return Err(format!("lignes[{position}].prixUnitaire must not be negative"));
        }
    }
    Ok(())
}
