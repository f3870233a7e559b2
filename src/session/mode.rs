//! Conversation modes for the chat session.
//!
//! Each mode is a pure selector: it maps to a fixed Arabic instruction
//! string injected as the leading system entry of every request, plus a
//! sampling temperature. Modes are never persisted; every session starts
//! in [`ConversationMode::General`].

use std::fmt;
use std::str::FromStr;

/// The fixed set of chat modes, mirroring the mode bar of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationMode {
    #[default]
    General,
    Coding,
    Writing,
    Translation,
    Analysis,
    ProblemSolving,
    Tutoring,
    Creative,
}

impl ConversationMode {
    /// All modes, in display order.
    pub fn all() -> &'static [ConversationMode] {
        &[
            ConversationMode::General,
            ConversationMode::Coding,
            ConversationMode::Writing,
            ConversationMode::Translation,
            ConversationMode::Analysis,
            ConversationMode::ProblemSolving,
            ConversationMode::Tutoring,
            ConversationMode::Creative,
        ]
    }

    /// ASCII identifier, used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ConversationMode::General => "general",
            ConversationMode::Coding => "coding",
            ConversationMode::Writing => "writing",
            ConversationMode::Translation => "translation",
            ConversationMode::Analysis => "analysis",
            ConversationMode::ProblemSolving => "problem-solving",
            ConversationMode::Tutoring => "tutoring",
            ConversationMode::Creative => "creative",
        }
    }

    /// Arabic label, shown in the mode picker.
    pub fn label(&self) -> &'static str {
        match self {
            ConversationMode::General => "عام",
            ConversationMode::Coding => "برمجة",
            ConversationMode::Writing => "كتابة",
            ConversationMode::Translation => "ترجمة",
            ConversationMode::Analysis => "تحليل",
            ConversationMode::ProblemSolving => "حل مشكلات",
            ConversationMode::Tutoring => "تعليمي",
            ConversationMode::Creative => "إبداعي",
        }
    }

    /// The system instruction sent as the first entry of every request.
    pub fn instructions(&self) -> &'static str {
        match self {
            ConversationMode::General => {
                "أنت مساعد ذكي متعدد المهارات، تقدم إجابات مفيدة ودقيقة باللغة العربية."
            }
            ConversationMode::Coding => {
                "أنت خبير برمجة متخصص، تساعد في كتابة وتحسين وشرح الأكواد بمختلف لغات البرمجة."
            }
            ConversationMode::Writing => {
                "أنت كاتب محترف، تساعد في إنشاء محتوى عالي الجودة بأساليب مختلفة."
            }
            ConversationMode::Translation => {
                "أنت مترجم محترف، تترجم النصوص بدقة مع الحفاظ على المعنى والسياق."
            }
            ConversationMode::Analysis => {
                "أنت محلل خبير، تحلل النصوص والبيانات وتستخرج الأفكار والنتائج المهمة."
            }
            ConversationMode::ProblemSolving => {
                "أنت مستشار خبير في حل المشكلات، تقدم حلول عملية ومنطقية."
            }
            ConversationMode::Tutoring => {
                "أنت معلم خبير، تشرح المفاهيم بطريقة بسيطة وواضحة مع أمثلة عملية."
            }
            ConversationMode::Creative => {
                "أنت مبدع متخصص، تساعد في توليد أفكار إبداعية وحلول مبتكرة."
            }
        }
    }

    /// Sampling temperature. Only the creative mode is turned up.
    pub fn temperature(&self) -> f32 {
        match self {
            ConversationMode::Creative => 0.9,
            _ => 0.7,
        }
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ConversationMode {
    type Err = String;

    /// Accepts either the ASCII name (`"coding"`) or the Arabic label
    /// (`"برمجة"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ConversationMode::all()
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(s) || m.label() == s)
            .copied()
            .ok_or_else(|| format!("unknown conversation mode: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ascii_name() {
        assert_eq!(
            "coding".parse::<ConversationMode>().unwrap(),
            ConversationMode::Coding
        );
        assert_eq!(
            "Problem-Solving".parse::<ConversationMode>().unwrap(),
            ConversationMode::ProblemSolving
        );
    }

    #[test]
    fn test_parse_arabic_label() {
        assert_eq!(
            "برمجة".parse::<ConversationMode>().unwrap(),
            ConversationMode::Coding
        );
        assert_eq!(
            "إبداعي".parse::<ConversationMode>().unwrap(),
            ConversationMode::Creative
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!("poetry".parse::<ConversationMode>().is_err());
    }

    #[test]
    fn test_temperature_only_creative_elevated() {
        for mode in ConversationMode::all() {
            let expected = if *mode == ConversationMode::Creative {
                0.9
            } else {
                0.7
            };
            assert_eq!(mode.temperature(), expected, "mode {mode}");
        }
    }

    #[test]
    fn test_default_is_general() {
        assert_eq!(ConversationMode::default(), ConversationMode::General);
    }
}
