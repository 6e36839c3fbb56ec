//! Fast question/data classification.
//!
//! A request is a question when it contains any marker of a fixed Korean
//! interrogative lexicon as a plain substring. Matching is case-sensitive and
//! does no normalization. Short markers such as `어` also fire inside longer
//! words, so some statements are routed as questions.

use serde::{Deserialize, Serialize};

/// Question markers, checked in order.
pub const QUESTION_MARKERS: &[&str] = &[
    // punctuation
    "?", "？",
    // interrogative words
    "뭐", "무엇", "무슨", "언제", "어디", "누구", "누가", "왜", "어떻게", "어떤", "어때", "몇",
    "얼마",
    // question and suggestion endings
    "니", "나요", "까", "냐", "어", "을래", "볼래",
    // request forms
    "알려", "말해", "보여", "찾아", "기억나",
];

/// Whether a request is a diary entry to store or a question to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingVerdict {
    /// Diary content to store.
    Data,
    /// A question about stored diaries.
    Question,
}

/// First marker found in `text`, in lexicon order.
pub fn matched_marker(text: &str) -> Option<&'static str> {
    QUESTION_MARKERS
        .iter()
        .copied()
        .find(|marker| text.contains(marker))
}

/// Classify `text`. Empty text is data.
pub fn classify(text: &str) -> RoutingVerdict {
    if matched_marker(text).is_some() {
        RoutingVerdict::Question
    } else {
        RoutingVerdict::Data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_is_data() {
        assert_eq!(classify("오늘 점심에 파스타를 먹었다"), RoutingVerdict::Data);
        assert_eq!(classify("친구랑 영화를 봤다. 재밌었다"), RoutingVerdict::Data);
        assert_eq!(matched_marker("오늘 점심에 파스타를 먹었다"), None);
    }

    #[test]
    fn test_questions() {
        assert_eq!(classify("오늘 날씨 어땠어?"), RoutingVerdict::Question);
        assert_eq!(classify("지난주에 뭐 먹었지"), RoutingVerdict::Question);
        assert_eq!(classify("내 일기 보여줘"), RoutingVerdict::Question);
        assert_eq!(classify("what did I eat?"), RoutingVerdict::Question);
        assert_eq!(classify("무슨 영화 봤는지 기억나"), RoutingVerdict::Question);
    }

    #[test]
    fn test_matched_marker_follows_lexicon_order() {
        assert_eq!(matched_marker("오늘 날씨 어땠어?"), Some("?"));
        assert_eq!(matched_marker("언제 갔더라"), Some("언제"));
    }

    #[test]
    fn test_empty_is_data() {
        assert_eq!(classify(""), RoutingVerdict::Data);
    }

    #[test]
    fn test_fragment_false_positive_is_accepted() {
        // "어" inside "어제" fires even though the sentence is a statement.
        assert_eq!(classify("어제 공원에 갔다"), RoutingVerdict::Question);
    }

    #[test]
    fn test_idempotent() {
        for text in ["오늘 날씨 어땠어?", "파스타를 먹었다", ""] {
            assert_eq!(classify(text), classify(text));
        }
    }

    #[test]
    fn test_no_normalization() {
        assert_eq!(classify("오늘 날씨 어 땠 다"), RoutingVerdict::Question);
        assert_eq!(classify("ABC"), RoutingVerdict::Data);
    }
}
