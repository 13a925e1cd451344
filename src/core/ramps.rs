//! Built-in color ramps.
//!
//! Interpolated ramps are stored as percentage rules, so every one of them
//! spans exactly `[min, max]` of the domain it is generated for.

use crate::core::rules::parse_rules_str;
use crate::domain::model::{ColorBreakpoint, ColorTable, Rgb, TableKind, ValueDomain};
use crate::utils::error::{ColorError, Result};

pub const RANDOM: &str = "random";
pub const GREY_EQ: &str = "grey.eq";
pub const GREY_LOG: &str = "grey.log";

/// Upper bound on the number of categories a random table may hold.
pub const MAX_RANDOM_CATEGORIES: i64 = 1_000_000;

struct RampDef {
    name: &'static str,
    description: &'static str,
    rules: &'static str,
}

const RAMPS: &[RampDef] = &[
    RampDef {
        name: "bcyr",
        description: "blue through cyan, yellow to red",
        rules: "0% blue\n33.333% cyan\n66.667% yellow\n100% red",
    },
    RampDef {
        name: "bgyr",
        description: "blue through green, yellow to red",
        rules: "0% blue\n33.333% green\n66.667% yellow\n100% red",
    },
    RampDef {
        name: "blues",
        description: "white to blue",
        rules: "0% 247:251:255\n50% 107:174:214\n100% 8:48:107",
    },
    RampDef {
        name: "byg",
        description: "blue through yellow to green",
        rules: "0% blue\n50% yellow\n100% green",
    },
    RampDef {
        name: "byr",
        description: "blue through yellow to red",
        rules: "0% blue\n50% yellow\n100% red",
    },
    RampDef {
        name: "elevation",
        description: "maps relative ranges of raster values to elevation color ramp",
        rules: "0% 0:191:191\n20% 0:255:0\n40% 255:255:0\n60% 255:127:0\n80% 191:127:63\n100% 200:200:200",
    },
    RampDef {
        name: "greens",
        description: "white to green",
        rules: "0% 247:252:245\n50% 116:196:118\n100% 0:68:27",
    },
    RampDef {
        name: "grey",
        description: "grey scale",
        rules: "0% black\n100% white",
    },
    RampDef {
        name: "gyr",
        description: "green through yellow to red",
        rules: "0% green\n50% yellow\n100% red",
    },
    RampDef {
        name: "magma",
        description: "perceptually uniform sequential, black through purple to light yellow",
        rules: "0% 0:0:4\n25% 81:18:124\n50% 183:55:121\n75% 252:137:97\n100% 252:253:191",
    },
    RampDef {
        name: "rainbow",
        description: "rainbow color table",
        rules: "0% yellow\n20% green\n40% cyan\n60% blue\n80% magenta\n100% red",
    },
    RampDef {
        name: "reds",
        description: "white to red",
        rules: "0% 255:245:240\n50% 251:106:74\n100% 103:0:13",
    },
    RampDef {
        name: "ryb",
        description: "red through yellow to blue",
        rules: "0% red\n50% yellow\n100% blue",
    },
    RampDef {
        name: "ryg",
        description: "red through yellow to green",
        rules: "0% red\n50% yellow\n100% green",
    },
    RampDef {
        name: "viridis",
        description: "perceptually uniform sequential, purple through green to yellow",
        rules: "0% 68:1:84\n25% 59:82:139\n50% 33:145:140\n75% 94:201:98\n100% 253:231:37",
    },
    RampDef {
        name: "wave",
        description: "color wave",
        rules: "0% 255:85:85\n16.666% 170:170:0\n33.333% 85:255:85\n50% 0:170:170\n66.666% 85:85:255\n83.333% 170:0:170\n100% 255:85:85",
    },
];

fn find(name: &str) -> Option<&'static RampDef> {
    RAMPS.iter().find(|def| def.name == name)
}

/// Every name accepted by [`generate`] plus the special ramps.
pub fn list_names() -> Vec<String> {
    let mut names: Vec<String> = RAMPS.iter().map(|def| def.name.to_string()).collect();
    names.extend([RANDOM, GREY_EQ, GREY_LOG].map(String::from));
    names.sort();
    names
}

pub fn exists(name: &str) -> bool {
    find(name).is_some() || [RANDOM, GREY_EQ, GREY_LOG].contains(&name)
}

pub fn describe(name: &str) -> Option<&'static str> {
    match name {
        RANDOM => Some("random color table"),
        GREY_EQ => Some("histogram-equalized grey scale"),
        GREY_LOG => Some("histogram logarithmic transformed grey scale"),
        _ => find(name).map(|def| def.description),
    }
}

/// Interpolated ramp `name` stretched over `domain`.
pub fn generate(name: &str, domain: &ValueDomain) -> Result<ColorTable> {
    let def = find(name).ok_or_else(|| ColorError::UnknownRampError {
        name: name.to_string(),
    })?;
    parse_rules_str(def.rules, domain)
}

/// One color per integer category, reproducible for a given `seed`.
pub fn random(domain: &ValueDomain, seed: u64) -> Result<ColorTable> {
    if domain.is_floating_point() {
        return Err(ColorError::RampUnsupportedForTypeError {
            ramp: RANDOM.to_string(),
            reason: "floating point attributes".to_string(),
        });
    }

    let min = domain.min() as i64;
    let max = domain.max() as i64;
    let categories = max
        .checked_sub(min)
        .and_then(|span| span.checked_add(1))
        .filter(|n| *n <= MAX_RANDOM_CATEGORIES)
        .ok_or_else(|| ColorError::RampUnsupportedForTypeError {
            ramp: RANDOM.to_string(),
            reason: format!(
                "categories {}..={} exceed the limit of {}",
                min, max, MAX_RANDOM_CATEGORIES
            ),
        })?;
    tracing::debug!("Generating {} random colors (seed {})", categories, seed);

    let mut rng = fastrand::Rng::with_seed(seed);
    let breakpoints = (min..=max)
        .map(|cat| ColorBreakpoint::new(cat as f64, Rgb::new(rng.u8(..), rng.u8(..), rng.u8(..))))
        .collect();
    ColorTable::new(breakpoints, TableKind::Categorical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_domain(min: f64, max: f64) -> ValueDomain {
        ValueDomain::new(min, max, false).unwrap()
    }

    #[test]
    fn test_every_interpolated_ramp_covers_domain() {
        let domains = [
            int_domain(0.0, 100.0),
            ValueDomain::new(-3.5, 0.25, true).unwrap(),
            ValueDomain::new(1e-3, 1e9, true).unwrap(),
        ];
        for def in RAMPS {
            for domain in &domains {
                let table = generate(def.name, domain).unwrap();
                let (lo, hi) = table.range().unwrap();
                assert!(lo <= domain.min(), "{} starts after min", def.name);
                assert!(hi >= domain.max(), "{} ends before max", def.name);
                assert_eq!(table.kind(), TableKind::Continuous);
            }
        }
    }

    #[test]
    fn test_grey_mid_value_is_mid_grey() {
        let table = generate("grey", &int_domain(0.0, 100.0)).unwrap();
        assert_eq!(table.range(), Some((0.0, 100.0)));
        let mid = table.lookup(50.0);
        assert_eq!((mid.r, mid.g, mid.b), (128, 128, 128));
    }

    #[test]
    fn test_degenerate_domain_gives_one_breakpoint() {
        for def in RAMPS {
            let table = generate(def.name, &int_domain(4.0, 4.0)).unwrap();
            assert_eq!(table.len(), 1, "{}", def.name);
            let color = table.breakpoints()[0].color;
            assert_eq!(table.lookup(-1e6), color);
            assert_eq!(table.lookup(4.0), color);
            assert_eq!(table.lookup(1e6), color);
        }
    }

    #[test]
    fn test_unknown_ramp() {
        assert!(matches!(
            generate("plaid", &int_domain(0.0, 1.0)),
            Err(ColorError::UnknownRampError { .. })
        ));
    }

    #[test]
    fn test_random_is_deterministic_and_categorical() {
        let domain = int_domain(1.0, 20.0);
        let a = random(&domain, 42).unwrap();
        let b = random(&domain, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert_eq!(a.kind(), TableKind::Categorical);
        assert_eq!(a.lookup(1.5), a.no_data_color());
        assert_ne!(a, random(&domain, 7).unwrap());
    }

    #[test]
    fn test_random_rejects_floating_point() {
        let domain = ValueDomain::new(0.0, 1.0, true).unwrap();
        assert!(matches!(
            random(&domain, 0),
            Err(ColorError::RampUnsupportedForTypeError { .. })
        ));
    }

    #[test]
    fn test_random_rejects_huge_ranges() {
        let domain = int_domain(0.0, 5e9);
        assert!(matches!(
            random(&domain, 0),
            Err(ColorError::RampUnsupportedForTypeError { .. })
        ));
    }

    #[test]
    fn test_random_rejects_ranges_overflowing_i64() {
        for (min, max) in [(-9e18, 9e18), (i64::MIN as f64, i64::MAX as f64)] {
            let domain = int_domain(min, max);
            assert!(matches!(
                random(&domain, 0),
                Err(ColorError::RampUnsupportedForTypeError { .. })
            ));
        }
    }

    #[test]
    fn test_catalog_listing() {
        let names = list_names();
        assert!(names.contains(&"grey".to_string()));
        assert!(names.contains(&RANDOM.to_string()));
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert!(names.iter().all(|n| exists(n) && describe(n).is_some()));
        assert!(!exists("plaid"));
    }
}
