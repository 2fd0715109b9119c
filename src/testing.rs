//! Testing helpers.

use crate::domain::Division;

pub fn division(name: &str, codes: &[&str]) -> Division {
    let codes: Vec<String> = codes.iter().map(ToString::to_string).collect();
    Division::from_row(name, &codes).expect("valid team codes")
}

/// A division of `count` teams coded `<prefix>1..<prefix><count>`.
pub fn numbered_division(name: &str, prefix: char, count: u8) -> Division {
    let codes: Vec<String> = (1..=count).map(|number| format!("{prefix}{number}")).collect();
    let codes_ref: Vec<&str> = codes.iter().map(String::as_str).collect();
    division(name, &codes_ref)
}
