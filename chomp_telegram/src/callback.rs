/// Actions carried in inline-keyboard callback data. Payloads are
/// dot-separated and carry option ids, never option texts: ids are stable,
/// unambiguous when two options read the same, and fit Telegram's payload
/// size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallbackAction {
    AnswerQuestions,
    RevealAnswers,
    FirstOrder { option_id: i64 },
    SecondOrder { percentage: u8, option_id: i64 },
    RevealConfirm,
    RevealCancel,
}

impl CallbackAction {
    pub(crate) fn parse(data: &str) -> Option<Self> {
        match data {
            "menu.answer" => return Some(Self::AnswerQuestions),
            "menu.reveal" => return Some(Self::RevealAnswers),
            "reveal.confirm" => return Some(Self::RevealConfirm),
            "reveal.cancel" => return Some(Self::RevealCancel),
            _ => {}
        }

        if let Some(option_id) = data.strip_prefix("answering-first-order.") {
            return option_id
                .parse()
                .ok()
                .map(|option_id| Self::FirstOrder { option_id });
        }

        if let Some(rest) = data.strip_prefix("answering-second-order.") {
            let (percentage, option_id) = rest.split_once('.')?;
            return Some(Self::SecondOrder {
                percentage: percentage.parse().ok().filter(|p| *p <= 100)?,
                option_id: option_id.parse().ok()?,
            });
        }

        None
    }

    pub(crate) fn encode(&self) -> String {
        match self {
            Self::AnswerQuestions => "menu.answer".to_string(),
            Self::RevealAnswers => "menu.reveal".to_string(),
            Self::RevealConfirm => "reveal.confirm".to_string(),
            Self::RevealCancel => "reveal.cancel".to_string(),
            Self::FirstOrder { option_id } => format!("answering-first-order.{option_id}"),
            Self::SecondOrder {
                percentage,
                option_id,
            } => format!("answering-second-order.{percentage}.{option_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_round_trips_through_its_payload() {
        let actions = [
            CallbackAction::AnswerQuestions,
            CallbackAction::RevealAnswers,
            CallbackAction::RevealConfirm,
            CallbackAction::RevealCancel,
            CallbackAction::FirstOrder { option_id: 17 },
            CallbackAction::SecondOrder {
                percentage: 80,
                option_id: 17,
            },
        ];

        for action in actions {
            assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
        }
    }

    #[test]
    fn second_order_payloads_carry_percentage_then_option_id() {
        assert_eq!(
            CallbackAction::SecondOrder {
                percentage: 0,
                option_id: 3
            }
            .encode(),
            "answering-second-order.0.3"
        );
        assert_eq!(
            CallbackAction::parse("answering-second-order.100.3"),
            Some(CallbackAction::SecondOrder {
                percentage: 100,
                option_id: 3
            })
        );
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        for data in [
            "",
            "menu.unknown",
            "answering-first-order.",
            "answering-first-order.abc",
            "answering-second-order.80",
            "answering-second-order.101.3",
            "answering-second-order.x.y",
        ] {
            assert_eq!(CallbackAction::parse(data), None, "{data:?}");
        }
    }
}
