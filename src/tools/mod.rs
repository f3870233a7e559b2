//! One-shot assistant tools.
//!
//! Each tool is a thin caller over the same pathway the chat uses:
//! compose a fixed-instruction prompt from a handful of fields, send one
//! provider request, show the result. No transcript is involved; every
//! invocation is independent.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::provider::{ChatMessage, ProviderRequest};
use crate::session::{SessionManager, SessionOutcome, MISSING_KEY_REPLY, TRANSPORT_ERROR_REPLY};

/// The fixed set of tools, one per screen of the original assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Summarize,
    Translate,
    CodeAssistant,
    TextAnalysis,
    ContentGenerator,
    ProblemSolver,
    AppIdeas,
    AppStructure,
}

impl ToolKind {
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Summarize,
            ToolKind::Translate,
            ToolKind::CodeAssistant,
            ToolKind::TextAnalysis,
            ToolKind::ContentGenerator,
            ToolKind::ProblemSolver,
            ToolKind::AppIdeas,
            ToolKind::AppStructure,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Summarize => "summarize",
            ToolKind::Translate => "translate",
            ToolKind::CodeAssistant => "code-assistant",
            ToolKind::TextAnalysis => "text-analysis",
            ToolKind::ContentGenerator => "content-generator",
            ToolKind::ProblemSolver => "problem-solver",
            ToolKind::AppIdeas => "app-ideas",
            ToolKind::AppStructure => "app-structure",
        }
    }

    /// Arabic title, shown in output headers.
    pub fn title(&self) -> &'static str {
        match self {
            ToolKind::Summarize => "تلخيص النصوص",
            ToolKind::Translate => "الترجمة",
            ToolKind::CodeAssistant => "مساعد البرمجة",
            ToolKind::TextAnalysis => "تحليل النصوص",
            ToolKind::ContentGenerator => "إنشاء المحتوى",
            ToolKind::ProblemSolver => "حل المشكلات",
            ToolKind::AppIdeas => "أفكار التطبيقات",
            ToolKind::AppStructure => "هيكل التطبيق",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Summarize => "summarize a text, keeping the main ideas",
            ToolKind::Translate => "translate a text (option: to=<language>)",
            ToolKind::CodeAssistant => {
                "explain/fix/improve code (options: task=<explain|fix|improve|comment|write|convert>, language=<name>)"
            }
            ToolKind::TextAnalysis => {
                "analyze a text (option: analysis=<sentiment|keywords|entities|classify|tone|keypoints>)"
            }
            ToolKind::ContentGenerator => {
                "generate content about a topic (options: type=<kind>, tone=<tone>, keywords=<list>)"
            }
            ToolKind::ProblemSolver => {
                "structured problem analysis (options: type=<kind>, urgency=<level>)"
            }
            ToolKind::AppIdeas => {
                "generate five app ideas (options: type=<kind>, problem=<text>, audience=<text>)"
            }
            ToolKind::AppStructure => {
                "outline an app from an idea (options: type=<kind>, platform=<name>, complexity=<level>)"
            }
        }
    }

    /// The system instruction for this tool.
    fn instructions(&self) -> &'static str {
        match self {
            ToolKind::Summarize => {
                "أنت خبير في تلخيص النصوص. تستخرج الأفكار الرئيسية وتعيد صياغتها بوضوح وإيجاز باللغة العربية."
            }
            ToolKind::Translate => {
                "أنت مترجم محترف، تترجم النصوص بدقة مع الحفاظ على المعنى والسياق."
            }
            ToolKind::CodeAssistant => {
                "أنت مساعد برمجة خبير، تقدم مساعدة احترافية في البرمجة والتطوير باللغة العربية. تكتب كود نظيف ومفهوم وتشرح الحلول بوضوح."
            }
            ToolKind::TextAnalysis => {
                "أنت محلل نصوص خبير. تقوم بتحليل النصوص بدقة وتقدم نتائج مفصلة ومفيدة باللغة العربية."
            }
            ToolKind::ContentGenerator => {
                "أنت مساعد متخصص في إنشاء المحتوى باللغة العربية. تنشئ محتوى عالي الجودة ومناسب للهدف المطلوب."
            }
            ToolKind::ProblemSolver => {
                "أنت مستشار خبير في حل المشكلات والتفكير النقدي. تقدم حلول عملية ومنطقية ومبتكرة للمشاكل المختلفة."
            }
            ToolKind::AppIdeas => {
                "أنت خبير في تطوير التطبيقات ورائد أعمال مبدع. تولد أفكار تطبيقات مبتكرة وعملية وقابلة للتنفيذ."
            }
            ToolKind::AppStructure => {
                "أنت مهندس برمجيات خبير ومصمم تطبيقات محترف. تقوم بإنشاء مخططات تفصيلية وعملية لتطوير التطبيقات."
            }
        }
    }

    fn temperature(&self) -> f32 {
        match self {
            ToolKind::Summarize | ToolKind::Translate | ToolKind::CodeAssistant
            | ToolKind::TextAnalysis => 0.3,
            ToolKind::ContentGenerator | ToolKind::ProblemSolver | ToolKind::AppStructure => 0.7,
            ToolKind::AppIdeas => 0.8,
        }
    }

    fn max_tokens(&self) -> u32 {
        match self {
            ToolKind::Summarize | ToolKind::TextAnalysis => 1000,
            ToolKind::ContentGenerator => 1500,
            ToolKind::Translate | ToolKind::CodeAssistant => 2000,
            ToolKind::AppIdeas => 2500,
            ToolKind::ProblemSolver | ToolKind::AppStructure => 3000,
        }
    }

    /// Shown when the provider returns nothing usable.
    fn empty_fallback(&self) -> &'static str {
        match self {
            ToolKind::Summarize => "لم أتمكن من تلخيص النص.",
            ToolKind::Translate => "لم أتمكن من ترجمة النص.",
            ToolKind::CodeAssistant => "لم أتمكن من تحليل الكود.",
            ToolKind::TextAnalysis => "لم أتمكن من تحليل النص.",
            ToolKind::ContentGenerator => "لم أتمكن من إنشاء المحتوى.",
            ToolKind::ProblemSolver => "لم أتمكن من تحليل المشكلة وتقديم حل.",
            ToolKind::AppIdeas => "لم أتمكن من توليد أفكار.",
            ToolKind::AppStructure => "لم أتمكن من إنشاء مخطط الهيكل.",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ToolKind::all()
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(s) || t.title() == s)
            .copied()
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

/// Input for one tool invocation: the primary text plus named fields.
#[derive(Debug, Clone, Default)]
pub struct ToolInput {
    pub text: String,
    options: HashMap<String, String>,
}

impl ToolInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: HashMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    fn option_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.option(key).unwrap_or(default)
    }
}

/// Compose the user prompt for a tool invocation.
pub fn build_prompt(kind: ToolKind, input: &ToolInput) -> String {
    let text = input.text.trim();
    match kind {
        ToolKind::Summarize => format!(
            "لخص النص التالي بشكل واضح ومختصر مع الحفاظ على الأفكار الرئيسية:\n\n{text}"
        ),
        ToolKind::Translate => {
            let to = input.option_or("to", "الإنجليزية");
            format!("ترجم النص التالي إلى {to} مع الحفاظ على المعنى والسياق:\n\n{text}")
        }
        ToolKind::CodeAssistant => {
            let language = input.option_or("language", "JavaScript");
            match input.option_or("task", "explain") {
                "fix" | "إصلاح الأخطاء" => format!(
                    "ابحث عن الأخطاء في الكود التالي المكتوب بلغة {language} واقترح الإصلاحات:\n\n{text}"
                ),
                "improve" | "تحسين الكود" => format!(
                    "حسّن الكود التالي المكتوب بلغة {language} واقترح تحسينات للأداء والقراءة:\n\n{text}"
                ),
                "comment" | "إضافة تعليقات" => format!(
                    "أضف تعليقات مفيدة وواضحة للكود التالي المكتوب بلغة {language}:\n\n{text}"
                ),
                "write" | "كتابة كود جديد" => {
                    format!("اكتب كود بلغة {language} للمهمة التالية:\n\n{text}")
                }
                "convert" | "تحويل لغة أخرى" => {
                    format!("حوّل الكود التالي إلى لغة {language}:\n\n{text}")
                }
                // "explain" and anything unrecognized
                _ => format!(
                    "اشرح الكود التالي المكتوب بلغة {language} بشكل مفصل وواضح باللغة العربية:\n\n{text}"
                ),
            }
        }
        ToolKind::TextAnalysis => match input.option_or("analysis", "sentiment") {
            "keywords" | "استخراج الكلمات المفتاحية" => format!(
                "استخرج أهم الكلمات المفتاحية والعبارات الأساسية من النص التالي:\n\n{text}"
            ),
            "entities" | "تحديد الكيانات" => format!(
                "حدد الكيانات المذكورة في النص التالي (أشخاص، أماكن، منظمات، تواريخ، إلخ):\n\n{text}"
            ),
            "classify" | "تصنيف الموضوع" => {
                format!("صنف موضوع النص التالي وحدد الفئة التي ينتمي إليها:\n\n{text}")
            }
            "tone" | "تحليل النبرة" => format!(
                "حلل نبرة الكاتب في النص التالي (رسمي، ودود، عدواني، مهني، إلخ):\n\n{text}"
            ),
            "keypoints" | "استخراج النقاط الرئيسية" => format!(
                "استخرج النقاط الرئيسية والأفكار الأساسية من النص التالي:\n\n{text}"
            ),
            // "sentiment" and anything unrecognized
            _ => format!(
                "حلل المشاعر في النص التالي وحدد ما إذا كان إيجابياً أم سلبياً أم محايداً مع تقديم تفسير مفصل:\n\n{text}"
            ),
        },
        ToolKind::ContentGenerator => {
            let content_type = input.option_or("type", "مقالة");
            let tone = input.option_or("tone", "احترافي");
            let keywords = input.option_or("keywords", "");
            format!(
                "أنشئ {content_type} عن موضوع \"{text}\" باستخدام الكلمات المفتاحية التالية: \"{keywords}\". يجب أن يكون النبرة {tone}. يرجى كتابة محتوى عالي الجودة ومفيد باللغة العربية."
            )
        }
        ToolKind::ProblemSolver => {
            let problem_type = input.option_or("type", "عام");
            let urgency = input.option_or("urgency", "متوسط");
            format!(
                "أحتاج مساعدة في حل المشكلة التالية:\n\n\
                 **وصف المشكلة:** {text}\n\
                 **نوع المشكلة:** {problem_type}\n\
                 **مستوى الأولوية:** {urgency}\n\n\
                 يرجى تقديم:\n\n\
                 1. **تحليل المشكلة:**\n   - الأسباب المحتملة\n   - تفكيك المشكلة إلى أجزاء أصغر\n   - النقاط الحرجة التي تحتاج انتباه\n\n\
                 2. **الحلول المقترحة:**\n   - الحل الأمثل (مع التبرير)\n   - حلول بديلة\n   - إيجابيات وسلبيات كل حل\n\n\
                 3. **خطة العمل:**\n   - الخطوات المطلوبة بالتسلسل\n   - الموارد المطلوبة\n   - الجدول الزمني المقترح\n\n\
                 4. **التحديات المتوقعة:**\n   - العقبات المحتملة\n   - كيفية التعامل معها\n   - خطط الطوارئ\n\n\
                 5. **طرق القياس:**\n   - كيفية معرفة نجاح الحل\n   - مؤشرات الأداء\n   - نقاط المراجعة\n\n\
                 6. **نصائح إضافية:**\n   - أفضل الممارسات\n   - موارد مفيدة للمساعدة"
            )
        }
        ToolKind::AppIdeas => {
            let app_type = input.option_or("type", "تطبيق موبايل");
            let mut prompt =
                format!("أنشئ 5 أفكار إبداعية ومبتكرة لـ {app_type} بناءً على المعلومات التالية:\n\n");
            if !text.is_empty() {
                prompt.push_str(&format!("الاهتمامات والمجالات: {text}\n"));
            }
            if let Some(problem) = input.option("problem") {
                prompt.push_str(&format!("المشكلة المراد حلها: {problem}\n"));
            }
            if let Some(audience) = input.option("audience") {
                prompt.push_str(&format!("الجمهور المستهدف: {audience}\n"));
            }
            prompt.push_str(
                "\nلكل فكرة، قدم:\n1. اسم التطبيق\n2. وصف موجز للفكرة\n3. الميزات الرئيسية\n4. الفائدة للمستخدمين\n5. تقدير مستوى الصعوبة في التطوير",
            );
            prompt
        }
        ToolKind::AppStructure => {
            let app_type = input.option_or("type", "تطبيق موبايل");
            let platform = input.option_or("platform", "متعدد المنصات");
            let complexity = input.option_or("complexity", "متوسط");
            format!(
                "قم بإنشاء مخطط تفصيلي لهيكل {app_type} بناءً على الفكرة التالية:\n\n\
                 الفكرة: {text}\n\
                 النوع: {app_type}\n\
                 المنصة المستهدفة: {platform}\n\
                 مستوى التعقيد: {complexity}\n\n\
                 يرجى تقديم:\n\n\
                 1. **الهيكل العام للتطبيق:**\n   - الشاشات الرئيسية\n   - التنقل بين الشاشات\n   - تدفق المستخدم (User Flow)\n\n\
                 2. **الميزات الأساسية:**\n   - الوظائف الرئيسية\n   - الوظائف الثانوية\n   - ميزات إضافية مقترحة\n\n\
                 3. **التقنيات المقترحة:**\n   - لغات البرمجة\n   - أطر العمل (Frameworks)\n   - قواعد البيانات\n   - خدمات السحابة\n\n\
                 4. **خطة التطوير:**\n   - المراحل الأساسية\n   - الأولويات\n   - التقدير الزمني التقريبي\n\n\
                 5. **اعتبارات التصميم:**\n   - واجهة المستخدم\n   - تجربة المستخدم\n   - الألوان والخطوط المقترحة\n\n\
                 6. **التحديات المحتملة:**\n   - الصعوبات التقنية\n   - الحلول المقترحة"
            )
        }
    }
}

/// Build the provider request for one tool invocation.
pub fn build_request(kind: ToolKind, input: &ToolInput) -> ProviderRequest {
    ProviderRequest {
        messages: vec![
            ChatMessage::system(kind.instructions()),
            ChatMessage::user(build_prompt(kind, input)),
        ],
        temperature: kind.temperature(),
        max_tokens: kind.max_tokens(),
    }
}

/// Run a tool end to end and return the text to display.
///
/// Failures come back as the same fixed user-facing strings the chat
/// uses; nothing here is fatal.
pub async fn run(manager: &SessionManager, kind: ToolKind, input: &ToolInput) -> String {
    let request = build_request(kind, input);
    match manager.dispatch(request).await {
        SessionOutcome::Reply(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                kind.empty_fallback().to_string()
            } else {
                trimmed.to_string()
            }
        }
        SessionOutcome::MissingCredential => MISSING_KEY_REPLY.to_string(),
        SessionOutcome::TransportFailure { .. } => TRANSPORT_ERROR_REPLY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[test]
    fn test_parse_tool_names() {
        assert_eq!(
            "code-assistant".parse::<ToolKind>().unwrap(),
            ToolKind::CodeAssistant
        );
        assert_eq!(
            "حل المشكلات".parse::<ToolKind>().unwrap(),
            ToolKind::ProblemSolver
        );
        assert!("unknown".parse::<ToolKind>().is_err());
    }

    #[test]
    fn test_request_shape() {
        let input = ToolInput::new("نص للتلخيص");
        let request = build_request(ToolKind::Summarize, &input);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 1000);
    }

    #[test]
    fn test_translate_default_language() {
        let prompt = build_prompt(ToolKind::Translate, &ToolInput::new("مرحبا"));
        assert!(prompt.contains("الإنجليزية"));

        let input = ToolInput::new("مرحبا").with_option("to", "الفرنسية");
        let prompt = build_prompt(ToolKind::Translate, &input);
        assert!(prompt.contains("الفرنسية"));
        assert!(!prompt.contains("الإنجليزية"));
    }

    #[test]
    fn test_code_assistant_tasks() {
        let base = ToolInput::new("fn main() {}").with_option("language", "Rust");

        let explain = build_prompt(ToolKind::CodeAssistant, &base);
        assert!(explain.contains("اشرح الكود"));
        assert!(explain.contains("Rust"));

        let fix = build_prompt(
            ToolKind::CodeAssistant,
            &base.clone().with_option("task", "fix"),
        );
        assert!(fix.contains("ابحث عن الأخطاء"));

        // Arabic task labels are accepted too.
        let convert = build_prompt(
            ToolKind::CodeAssistant,
            &base.clone().with_option("task", "تحويل لغة أخرى"),
        );
        assert!(convert.contains("حوّل الكود"));
    }

    #[test]
    fn test_text_analysis_variants() {
        let input = ToolInput::new("نص");
        let sentiment = build_prompt(ToolKind::TextAnalysis, &input);
        assert!(sentiment.contains("حلل المشاعر"));

        let entities = build_prompt(
            ToolKind::TextAnalysis,
            &input.clone().with_option("analysis", "entities"),
        );
        assert!(entities.contains("حدد الكيانات"));
    }

    #[test]
    fn test_app_ideas_skips_blank_fields() {
        let prompt = build_prompt(ToolKind::AppIdeas, &ToolInput::new(""));
        assert!(!prompt.contains("الاهتمامات والمجالات"));
        assert!(!prompt.contains("الجمهور المستهدف"));
        assert!(prompt.contains("5 أفكار"));

        let input = ToolInput::new("الصحة واللياقة").with_option("audience", "الطلاب");
        let prompt = build_prompt(ToolKind::AppIdeas, &input);
        assert!(prompt.contains("الاهتمامات والمجالات: الصحة واللياقة"));
        assert!(prompt.contains("الجمهور المستهدف: الطلاب"));
    }

    #[test]
    fn test_app_structure_defaults() {
        let prompt = build_prompt(ToolKind::AppStructure, &ToolInput::new("تطبيق للقراءة"));
        assert!(prompt.contains("المنصة المستهدفة: متعدد المنصات"));
        assert!(prompt.contains("مستوى التعقيد: متوسط"));
        assert!(prompt.contains("الفكرة: تطبيق للقراءة"));
    }

    #[test]
    fn test_every_tool_builds_a_two_entry_request() {
        let input = ToolInput::new("نص تجريبي");
        for kind in ToolKind::all() {
            let request = build_request(*kind, &input);
            assert_eq!(request.messages.len(), 2, "tool {kind}");
            assert!(request.temperature > 0.0);
            assert!(request.max_tokens >= 1000);
        }
    }
}
