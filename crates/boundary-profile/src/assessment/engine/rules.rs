use tracing::{debug, warn};

use super::super::bank::ItemBank;
use super::super::domain::AnswerSet;
use super::{StaleAnswer, StaleReason, Tally};

pub(crate) fn tally(bank: &ItemBank, answers: &AnswerSet) -> Tally {
    let mut scores = bank.categories().zeroed();
    let mut stale = Vec::new();
    let mut answered = 0;

    for (item_id, label) in answers.iter() {
        let Some(item) = bank.item(item_id) else {
            warn!(item = %item_id, label, "answer references an item outside the bank");
            stale.push(StaleAnswer {
                item_id: item_id.clone(),
                label: label.to_string(),
                reason: StaleReason::UnknownItem,
            });
            continue;
        };

        match item.option(label) {
            Some(option) => {
                scores.increment(option.category);
                answered += 1;
            }
            None => {
                warn!(item = %item_id, label, "answer references an option the item no longer offers");
                stale.push(StaleAnswer {
                    item_id: item_id.clone(),
                    label: label.to_string(),
                    reason: StaleReason::UnknownOption,
                });
            }
        }
    }

    debug!(answered, stale = stale.len(), "answers tallied");

    Tally {
        scores,
        answered,
        stale,
    }
}
