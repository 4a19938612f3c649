use crate::expression::{self, ExpressionError};

use super::radial::InteractionState;

const HELP: &str = "help";
const TEXT: &str = "text";

/// 命令行输入的分类结果。
#[derive(Debug, Clone, PartialEq)]
pub enum TypedCommand {
    Help,
    Text,
    /// 以角度制输入的引线方向。
    Angle(f64),
    InvalidExpression {
        input: String,
        error: ExpressionError,
    },
    Unrecognized(String),
}

/// 等待标注文字时，整行输入原样作为文字，不参与命令匹配。
#[inline]
pub fn consumes_verbatim(state: InteractionState) -> bool {
    state == InteractionState::AwaitingText
}

/// 当前状态下可用的命令关键字（`help` 始终可用，不列出）。
pub fn available_commands(state: InteractionState) -> Vec<&'static str> {
    match state {
        InteractionState::AwaitingEntity | InteractionState::AwaitingPosition => vec![TEXT],
        InteractionState::AwaitingText | InteractionState::Idle => Vec::new(),
    }
}

/// 解析一行命令。关键字忽略大小写与首尾空白；
/// 在 `AwaitingPosition` 中其余输入按表达式求值为角度。
pub fn classify(input: &str, state: InteractionState) -> TypedCommand {
    let trimmed = input.trim();
    let keyword = trimmed.to_lowercase();

    if keyword == HELP {
        return TypedCommand::Help;
    }
    if keyword == TEXT && available_commands(state).contains(&TEXT) {
        return TypedCommand::Text;
    }

    if state == InteractionState::AwaitingPosition {
        return match expression::evaluate(trimmed) {
            Ok(degrees) => TypedCommand::Angle(degrees),
            Err(error) => TypedCommand::InvalidExpression {
                input: trimmed.to_string(),
                error,
            },
        };
    }

    TypedCommand::Unrecognized(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_is_recognised_everywhere_the_grammar_runs() {
        for state in [
            InteractionState::AwaitingEntity,
            InteractionState::AwaitingPosition,
            InteractionState::Idle,
        ] {
            assert_eq!(classify("help", state), TypedCommand::Help);
            assert_eq!(classify("  HELP ", state), TypedCommand::Help);
        }
    }

    #[test]
    fn text_keyword_depends_on_state() {
        assert_eq!(
            classify("text", InteractionState::AwaitingEntity),
            TypedCommand::Text
        );
        assert_eq!(
            classify("Text", InteractionState::AwaitingPosition),
            TypedCommand::Text
        );
        assert_eq!(
            classify("text", InteractionState::Idle),
            TypedCommand::Unrecognized("text".to_string())
        );
    }

    #[test]
    fn numbers_are_angles_only_while_awaiting_position() {
        assert_eq!(
            classify("45", InteractionState::AwaitingPosition),
            TypedCommand::Angle(45.0)
        );
        assert_eq!(
            classify("90 / 2 + 15", InteractionState::AwaitingPosition),
            TypedCommand::Angle(60.0)
        );
        assert_eq!(
            classify("45", InteractionState::AwaitingEntity),
            TypedCommand::Unrecognized("45".to_string())
        );
    }

    #[test]
    fn malformed_angle_reports_expression_error() {
        match classify("4 5", InteractionState::AwaitingPosition) {
            TypedCommand::InvalidExpression { input, error } => {
                assert_eq!(input, "4 5");
                assert!(matches!(error, ExpressionError::UnexpectedChar { .. }));
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn only_text_state_consumes_verbatim() {
        assert!(consumes_verbatim(InteractionState::AwaitingText));
        assert!(!consumes_verbatim(InteractionState::AwaitingEntity));
        assert!(!consumes_verbatim(InteractionState::AwaitingPosition));
        assert!(available_commands(InteractionState::AwaitingText).is_empty());
        assert_eq!(
            available_commands(InteractionState::AwaitingPosition),
            vec!["text"]
        );
    }
}
