//! Emotion classification prompt.

use oneul_core::types::{BaseEmotion, ExtendedEmotion, WarningSign};

/// System message framing the assistant's role.
pub const SYSTEM_PROMPT: &str = "당신은 노인 복지 센터에서 사용하는 감정 분석 도우미입니다.";

/// Instruction enumerating the three taxonomies and the reply format.
pub fn classification_prompt() -> String {
    format!(
        "다음 노인 분의 표정과 전반 상황을 살펴보고 감정을 분류해주세요.\n\
         1) 기본 감정 {base_n}가지 중 하나를 선택하세요: {base}\n\
         2) 확장 정서 {ext_n}가지 중 하나를 선택하세요: {ext}\n\
         3) 위험 징후 {warn_n}가지에서 해당되는 항목이 있으면 모두 나열하세요: {warn} (없다면 빈 배열)\n\n\
         다음 JSON 형식으로만 답변하세요:\n\
         {{\n\
         \x20 \"base_emotion\": \"<기본 감정 1개>\",\n\
         \x20 \"extended_emotion\": \"<확장 정서 1개>\",\n\
         \x20 \"warning_signs\": [\"<위험 징후 또는 빈 배열>\"],\n\
         \x20 \"confidence\": <0~100 숫자>,\n\
         \x20 \"summary\": \"<짧은 한 줄 설명>\"\n\
         }}\n\
         선택지는 반드시 위에서 제시한 단어만 사용하세요.",
        base_n = BaseEmotion::ALL.len(),
        base = BaseEmotion::labels().join(", "),
        ext_n = ExtendedEmotion::ALL.len(),
        ext = ExtendedEmotion::labels().join(", "),
        warn_n = WarningSign::ALL.len(),
        warn = WarningSign::labels().join(", "),
    )
}
