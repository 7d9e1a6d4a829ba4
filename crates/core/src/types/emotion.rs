use serde::{Deserialize, Serialize};

// =============================================================================
// Closed Taxonomies
// =============================================================================

/// Generates a closed label enumeration whose wire form is the Korean term.
macro_rules! taxonomy {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in prompt order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire label of this member.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Look up a member by its wire label.
            pub fn from_label(label: &str) -> Option<Self> {
                match label.trim() {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// All wire labels, in prompt order.
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.label()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

taxonomy! {
    /// Primary emotion, exactly one per classification.
    BaseEmotion {
        Joy => "기쁨",
        Sadness => "슬픔",
        Anger => "분노",
        Surprise => "놀람",
        Fear => "공포",
        Disgust => "혐오",
        Neutral => "중립",
    }
}

taxonomy! {
    /// Secondary, more nuanced emotional state layered on the base emotion.
    ExtendedEmotion {
        Calm => "평온",
        Depressed => "우울",
        Fatigue => "피로",
        Loneliness => "외로움",
        Anxiety => "불안",
        Tension => "긴장",
        Satisfaction => "만족",
        Lethargy => "무기력",
    }
}

taxonomy! {
    /// Risk indicator that may co-occur with any emotion.
    WarningSign {
        Pain => "통증",
        Confusion => "혼미",
        BreathingDifficulty => "호흡곤란",
        ProlongedSilence => "장기침묵",
        SelfBlame => "자책발언",
        SocialIsolation => "사회고립",
    }
}

// =============================================================================
// Classification Result
// =============================================================================

/// Validated emotion classification of a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub base_emotion: BaseEmotion,
    pub extended_emotion: ExtendedEmotion,
    /// Distinct warning signs, in the order the provider listed them.
    pub warning_signs: Vec<WarningSign>,
    /// Provider confidence, 0 to 100.
    pub confidence: u8,
    pub summary: String,
}

/// The three enumerations, echoed to clients alongside every analysis.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionCategories {
    pub base_emotions: Vec<&'static str>,
    pub extended_emotions: Vec<&'static str>,
    pub warning_signs: Vec<&'static str>,
}

impl EmotionCategories {
    pub fn new() -> Self {
        Self {
            base_emotions: BaseEmotion::labels(),
            extended_emotions: ExtendedEmotion::labels(),
            warning_signs: WarningSign::labels(),
        }
    }
}

impl Default for EmotionCategories {
    fn default() -> Self {
        Self::new()
    }
}
