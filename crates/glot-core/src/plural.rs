/// Plural rule families supported by catalogs.
///
/// The rule picks a variant name from `(rule, count)`; variant names are the
/// CLDR-ish set `zero/one/two/few/many/other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluralRule {
    #[default]
    Default,
    Slavic,
    Arabic,
}

impl PluralRule {
    /// Parse a rule name as it appears in `@meta plural = ...` (case-insensitive).
    pub fn parse_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "slavic" => Some(Self::Slavic),
            "arabic" => Some(Self::Arabic),
            _ => None,
        }
    }

    /// Wire value used by the binary catalog header.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::Slavic => 1,
            Self::Arabic => 2,
        }
    }

    /// Inverse of [`as_u8`](Self::as_u8); unknown values fall back to `Default`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Slavic,
            2 => Self::Arabic,
            _ => Self::Default,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Slavic => "slavic",
            Self::Arabic => "arabic",
        }
    }

    /// Select the variant name for a count. Total over all inputs.
    pub fn pick_variant(self, count: i64) -> &'static str {
        if count < 0 {
            return "other";
        }

        match self {
            Self::Default => match count {
                0 => "zero",
                1 => "one",
                _ => "other",
            },
            Self::Slavic => {
                let m10 = count % 10;
                let m100 = count % 100;
                if m10 == 1 && m100 != 11 {
                    "one"
                } else if (2..=4).contains(&m10) && !(12..=14).contains(&m100) {
                    "few"
                } else if m10 == 0 || (5..=9).contains(&m10) || (11..=14).contains(&m100) {
                    "many"
                } else {
                    "other"
                }
            }
            Self::Arabic => {
                let m100 = count % 100;
                match count {
                    0 => "zero",
                    1 => "one",
                    2 => "two",
                    _ if (3..=10).contains(&m100) => "few",
                    _ if (11..=99).contains(&m100) => "many",
                    _ => "other",
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 6] = ["zero", "one", "two", "few", "many", "other"];

    #[test]
    fn parse_name_is_case_insensitive() {
        assert_eq!(PluralRule::parse_name("SLAVIC"), Some(PluralRule::Slavic));
        assert_eq!(PluralRule::parse_name("Arabic"), Some(PluralRule::Arabic));
        assert_eq!(PluralRule::parse_name("default"), Some(PluralRule::Default));
        assert_eq!(PluralRule::parse_name("klingon"), None);
    }

    #[test]
    fn negative_counts_are_other() {
        for rule in [PluralRule::Default, PluralRule::Slavic, PluralRule::Arabic] {
            assert_eq!(rule.pick_variant(-1), "other");
            assert_eq!(rule.pick_variant(-42), "other");
        }
    }

    #[test]
    fn default_rule() {
        assert_eq!(PluralRule::Default.pick_variant(0), "zero");
        assert_eq!(PluralRule::Default.pick_variant(1), "one");
        assert_eq!(PluralRule::Default.pick_variant(2), "other");
        assert_eq!(PluralRule::Default.pick_variant(100), "other");
    }

    #[test]
    fn slavic_rule() {
        assert_eq!(PluralRule::Slavic.pick_variant(1), "one");
        assert_eq!(PluralRule::Slavic.pick_variant(21), "one");
        assert_eq!(PluralRule::Slavic.pick_variant(11), "many");
        assert_eq!(PluralRule::Slavic.pick_variant(3), "few");
        assert_eq!(PluralRule::Slavic.pick_variant(12), "many");
        assert_eq!(PluralRule::Slavic.pick_variant(5), "many");
        assert_eq!(PluralRule::Slavic.pick_variant(0), "many");
        assert_eq!(PluralRule::Slavic.pick_variant(22), "few");
    }

    #[test]
    fn arabic_rule() {
        assert_eq!(PluralRule::Arabic.pick_variant(0), "zero");
        assert_eq!(PluralRule::Arabic.pick_variant(1), "one");
        assert_eq!(PluralRule::Arabic.pick_variant(2), "two");
        assert_eq!(PluralRule::Arabic.pick_variant(3), "few");
        assert_eq!(PluralRule::Arabic.pick_variant(110), "few");
        assert_eq!(PluralRule::Arabic.pick_variant(11), "many");
        assert_eq!(PluralRule::Arabic.pick_variant(99), "many");
        assert_eq!(PluralRule::Arabic.pick_variant(100), "other");
    }

    #[test]
    fn pick_is_total_over_sample_range() {
        for rule in [PluralRule::Default, PluralRule::Slavic, PluralRule::Arabic] {
            for count in -1..=1000 {
                let name = rule.pick_variant(count);
                assert!(NAMES.contains(&name), "{rule:?} {count} -> {name}");
            }
        }
    }

    #[test]
    fn wire_round_trip() {
        for rule in [PluralRule::Default, PluralRule::Slavic, PluralRule::Arabic] {
            assert_eq!(PluralRule::from_u8(rule.as_u8()), rule);
        }
        assert_eq!(PluralRule::from_u8(200), PluralRule::Default);
    }
}
