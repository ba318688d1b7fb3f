//! Validate command implementation
//!
//! Checks one value against its category's checksum or structure validator.

use crate::core::detection::normalize_for_validation;
use crate::core::detection::validators::validate;
use crate::domain::Category;
use clap::Args;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Category identifier (iban, creditCard, dni, nie, cif, email, phone)
    pub category: String,

    /// Value to check
    pub value: String,
}

impl ValidateArgs {
    /// Execute the validate command
    ///
    /// Exit code 0 when the value is valid, 1 when it is not, 2 for an
    /// unknown category or one without a validator.
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let category: Category = match self.category.parse() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let normalized = normalize_for_validation(&self.value, category);
        match validate(category, &normalized) {
            Some(true) => {
                println!("✅ Valid {category}");
                Ok(0)
            }
            Some(false) => {
                println!("❌ Invalid {category}");
                Ok(1)
            }
            None => {
                eprintln!("Category {category} has no validator");
                Ok(2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(category: &str, value: &str) -> ValidateArgs {
        ValidateArgs {
            category: category.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_card() {
        assert_eq!(args("creditCard", "4111 1111 1111 1111").execute().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_card() {
        assert_eq!(args("creditCard", "4111111111111112").execute().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_without_validator() {
        assert_eq!(args("fullName", "Ana García").execute().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_category() {
        assert_eq!(args("galaxy", "x").execute().await.unwrap(), 2);
    }
}
