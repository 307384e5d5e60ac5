use serde::Serialize;

/// Grade thresholds, inclusive at the lower bound. Product policy, kept
/// separate from the extraction mechanics.
pub const GRADE_A_MIN: i32 = 85;
pub const GRADE_B_MIN: i32 = 70;
pub const GRADE_C_MIN: i32 = 50;

/// Ordinal audit grade, highest to lowest. Serializes as the bare letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    /// Total over any integer: bounds enforcement is the extractor's job,
    /// out-of-range scores still classify through the same thresholds.
    pub fn from_score(score: i32) -> Self {
        if score >= GRADE_A_MIN {
            Self::A
        } else if score >= GRADE_B_MIN {
            Self::B
        } else if score >= GRADE_C_MIN {
            Self::C
        } else {
            Self::D
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Presentation hint consumed by the audit UI.
    pub fn style(self) -> &'static str {
        match self {
            Self::A => "bg-[#13ec6d] text-[#102218]",
            Self::B => "bg-blue-400 text-black",
            Self::C => "bg-yellow-400 text-black",
            Self::D => "bg-red-400 text-black",
        }
    }
}

/// Style lookup by letter; anything unrecognized renders as the lowest grade.
pub fn style_for_letter(letter: &str) -> &'static str {
    match letter {
        "A" => Grade::A.style(),
        "B" => Grade::B.style(),
        "C" => Grade::C.style(),
        _ => Grade::D.style(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_at_lower_bound() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(85), Grade::A);
        assert_eq!(Grade::from_score(84), Grade::B);
        assert_eq!(Grade::from_score(70), Grade::B);
        assert_eq!(Grade::from_score(69), Grade::C);
        assert_eq!(Grade::from_score(50), Grade::C);
        assert_eq!(Grade::from_score(49), Grade::D);
        assert_eq!(Grade::from_score(0), Grade::D);
    }

    #[test]
    fn out_of_range_scores_still_classify() {
        assert_eq!(Grade::from_score(150), Grade::A);
        assert_eq!(Grade::from_score(-5), Grade::D);
    }

    #[test]
    fn grade_serializes_as_letter() {
        let json = serde_json::to_string(&Grade::B).expect("serialize grade");
        assert_eq!(json, "\"B\"");
    }

    #[test]
    fn unknown_letter_falls_back_to_lowest_style() {
        assert_eq!(style_for_letter("F"), Grade::D.style());
        assert_eq!(style_for_letter("A"), Grade::A.style());
    }
}
