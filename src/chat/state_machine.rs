//! Transition table of the chat flow.
//!
//! `transition` is pure: it decides the next step and what has to be done,
//! `ChatSession` carries the action out.

/// Where a conversation stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationStep {
    #[default]
    AwaitingUrl,
    AwaitingCriteria {
        url: String,
    },
    /// Batches are being served; only commands are understood here.
    Extracting {
        url: String,
        criteria: String,
    },
}

impl ConversationStep {
    pub fn name(&self) -> &'static str {
        match self {
            ConversationStep::AwaitingUrl => "awaiting_url",
            ConversationStep::AwaitingCriteria { .. } => "awaiting_criteria",
            ConversationStep::Extracting { .. } => "extracting",
        }
    }
}

/// Commands understood while extracting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Continue,
    Finish,
    Other,
}

impl Command {
    /// Case-insensitive, surrounding whitespace ignored.
    pub fn parse(message: &str) -> Self {
        let message = message.trim();
        if message.eq_ignore_ascii_case("CONTINUE") {
            Command::Continue
        } else if message.eq_ignore_ascii_case("FINISH") {
            Command::Finish
        } else {
            Command::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AskForCriteria,
    /// Explain the schema and extract at offset 0.
    FirstBatch,
    /// Extract at the next offset.
    NextBatch,
    /// Render everything collected, then start over.
    Consolidate,
    /// Unrecognised input while extracting; nothing changes.
    Remind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ConversationStep,
    pub action: Action,
}

pub fn transition(step: &ConversationStep, message: &str) -> Transition {
    match step {
        ConversationStep::AwaitingUrl => Transition {
            next: ConversationStep::AwaitingCriteria {
                url: message.trim().to_string(),
            },
            action: Action::AskForCriteria,
        },
        ConversationStep::AwaitingCriteria { url } => Transition {
            next: ConversationStep::Extracting {
                url: url.clone(),
                criteria: message.to_string(),
            },
            action: Action::FirstBatch,
        },
        ConversationStep::Extracting { .. } => match Command::parse(message) {
            Command::Continue => Transition {
                next: step.clone(),
                action: Action::NextBatch,
            },
            Command::Finish => Transition {
                next: ConversationStep::AwaitingUrl,
                action: Action::Consolidate,
            },
            Command::Other => Transition {
                next: step.clone(),
                action: Action::Remind,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracting() -> ConversationStep {
        ConversationStep::Extracting {
            url: "https://example.com/resorts".to_string(),
            criteria: "5 stars".to_string(),
        }
    }

    #[test]
    fn test_commands_are_literal_text_before_extracting() {
        let t = transition(&ConversationStep::AwaitingUrl, "CONTINUE");
        assert_eq!(t.action, Action::AskForCriteria);
        assert_eq!(
            t.next,
            ConversationStep::AwaitingCriteria {
                url: "CONTINUE".to_string()
            }
        );

        let t = transition(&t.next, "finish");
        assert_eq!(t.action, Action::FirstBatch);
        assert_eq!(
            t.next,
            ConversationStep::Extracting {
                url: "CONTINUE".to_string(),
                criteria: "finish".to_string()
            }
        );
    }

    #[test]
    fn test_extracting_commands() {
        let step = extracting();

        let t = transition(&step, "continue");
        assert_eq!((t.action, &t.next), (Action::NextBatch, &step));

        let t = transition(&step, "  Finish \n");
        assert_eq!((t.action, t.next), (Action::Consolidate, ConversationStep::AwaitingUrl));
    }

    #[test]
    fn test_other_input_loops_in_place() {
        let mut step = extracting();
        for message in ["more please", "CONTINUE now", ""] {
            let t = transition(&step, message);
            assert_eq!(t.action, Action::Remind);
            assert_eq!(t.next, step);
            step = t.next;
        }
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("CoNtInUe"), Command::Continue);
        assert_eq!(Command::parse("FINISH"), Command::Finish);
        assert_eq!(Command::parse("FINISHED"), Command::Other);
    }
}
