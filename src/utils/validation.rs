use crate::domain::model::{RuleInput, StyleChoice, TransformFlags};
use crate::utils::error::{ColorError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ColorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ColorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Dataset names become file names, so they may not contain separators.
pub fn validate_dataset_name(field_name: &str, name: &str) -> Result<()> {
    validate_non_empty_string(field_name, name)?;

    if name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
        return Err(ColorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Dataset name cannot contain path separators".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ColorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ColorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Picks the single coloring choice among `color`, `rules` and `donor`.
///
/// `Ok(None)` when none is given; more than one is an error.
pub fn resolve_style(
    color: Option<&str>,
    rules: Option<&str>,
    donor: Option<&str>,
) -> Result<Option<StyleChoice>> {
    let given = [color.is_some(), rules.is_some(), donor.is_some()]
        .iter()
        .filter(|set| **set)
        .count();
    if given > 1 {
        return Err(ColorError::MutuallyExclusiveOptionsError {
            options: "<color>, <rules> and <donor>".to_string(),
        });
    }

    if let Some(name) = color {
        validate_non_empty_string("color", name)?;
        return Ok(Some(StyleChoice::NamedRamp(name.to_string())));
    }
    if let Some(rules) = rules {
        validate_path("rules", rules)?;
        return Ok(Some(StyleChoice::RuleFile(RuleInput::from_arg(rules))));
    }
    if let Some(donor) = donor {
        validate_dataset_name("donor", donor)?;
        return Ok(Some(StyleChoice::Donor(donor.to_string())));
    }
    Ok(None)
}

pub fn require_style(style: Option<StyleChoice>) -> Result<StyleChoice> {
    style.ok_or_else(|| ColorError::MissingOptionError {
        option: "one of -r, <color>, <rules> or <donor>".to_string(),
    })
}

pub fn validate_flags(
    invert: bool,
    log_scale: bool,
    abs_log_scale: bool,
    histogram_equalize: bool,
) -> Result<TransformFlags> {
    let flags = TransformFlags {
        invert,
        log_scale,
        abs_log_scale,
        histogram_equalize,
    };
    flags.validate()?;
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("log_samples", 5, 1).is_ok());
        assert!(validate_positive_number("log_samples", 0, 1).is_err());
    }

    #[test]
    fn test_resolve_style() {
        assert_eq!(
            resolve_style(Some("grey"), None, None).unwrap(),
            Some(StyleChoice::NamedRamp("grey".to_string()))
        );
        assert_eq!(
            resolve_style(None, Some("-"), None).unwrap(),
            Some(StyleChoice::RuleFile(RuleInput::Stdin))
        );
        assert_eq!(
            resolve_style(None, Some("rules.txt"), None).unwrap(),
            Some(StyleChoice::RuleFile(RuleInput::Path(PathBuf::from("rules.txt"))))
        );
        assert_eq!(
            resolve_style(None, None, Some("elevation")).unwrap(),
            Some(StyleChoice::Donor("elevation".to_string()))
        );
        assert_eq!(resolve_style(None, None, None).unwrap(), None);
    }

    #[test]
    fn test_resolve_style_conflicts() {
        assert!(matches!(
            resolve_style(Some("grey"), Some("rules.txt"), None),
            Err(ColorError::MutuallyExclusiveOptionsError { .. })
        ));
        assert!(matches!(
            resolve_style(Some("grey"), None, Some("dem")),
            Err(ColorError::MutuallyExclusiveOptionsError { .. })
        ));
    }

    #[test]
    fn test_require_style() {
        assert!(matches!(
            require_style(None),
            Err(ColorError::MissingOptionError { .. })
        ));
    }

    #[test]
    fn test_validate_flags() {
        assert!(validate_flags(true, true, false, true).is_ok());
        assert!(validate_flags(false, true, true, false).is_err());
    }
}
