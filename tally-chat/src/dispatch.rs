use std::sync::Arc;

use tally_core::{Money, PartyId, ScopeId};
use tally_engine::{normalize_payees, ChargeRequest, DebtEngine};
use tracing::warn;

use crate::command::{ChargeTargets, Command};
use crate::render::Renderer;
use crate::roster::Roster;

/// One inbound chat message, already stripped of transport detail.
#[derive(Clone, Debug)]
pub struct Inbound {
    pub scope: ScopeId,
    pub sender: PartyId,
    pub text: String,
}

/// Turns one inbound message into at most one reply: parse, call the
/// engine, render. Sending the reply is the embedder's job.
pub struct Dispatcher {
    engine: DebtEngine,
    roster: Arc<dyn Roster>,
    renderer: Renderer,
}

impl Dispatcher {
    pub fn new(engine: DebtEngine, roster: Arc<dyn Roster>, renderer: Renderer) -> Self {
        Self {
            engine,
            roster,
            renderer,
        }
    }

    /// `None` when the message asks for nothing.
    pub fn dispatch(&self, inbound: &Inbound) -> Option<String> {
        let command = Command::parse(&inbound.text)?;
        Some(self.execute(inbound, command))
    }

    fn execute(&self, inbound: &Inbound, command: Command) -> String {
        match command {
            Command::Charge {
                targets,
                amount,
                reason,
            } => self.charge(inbound, targets, &amount, reason),
            Command::Balance { personal: false } => {
                match self.engine.all_balances(inbound.scope) {
                    Ok(balances) => self.renderer.balances(&balances),
                    Err(err) => self.renderer.engine_error(&err),
                }
            }
            Command::Balance { personal: true } => {
                match self.engine.balances_involving(inbound.scope, &inbound.sender) {
                    Ok(balances) => self.renderer.personal_balances(&balances),
                    Err(err) => self.renderer.engine_error(&err),
                }
            }
            Command::History { days } => match self.engine.history(inbound.scope, days) {
                Ok(entries) => self.renderer.history(days, &entries),
                Err(err) => self.renderer.engine_error(&err),
            },
            Command::Entries => match self.engine.entries(inbound.scope) {
                Ok(entries) => self.renderer.entries_list(&entries),
                Err(err) => self.renderer.engine_error(&err),
            },
            Command::Cancel => match self.engine.cancel(inbound.scope, &inbound.sender) {
                Ok(outcome) => self.renderer.cancelled(&outcome),
                Err(err) => self.renderer.engine_error(&err),
            },
            Command::Help => self.renderer.help(),
            Command::Start => self.renderer.start(),
            Command::Unknown => self.renderer.unknown_command(),
        }
    }

    fn charge(
        &self,
        inbound: &Inbound,
        targets: ChargeTargets,
        amount: &str,
        reason: Option<String>,
    ) -> String {
        let total = match Money::parse(amount) {
            Ok(total) if total.is_positive() => total,
            _ => return self.renderer.invalid_amount(),
        };
        let (payees, participants, all_members) = match targets {
            ChargeTargets::Mentions(mentions) => {
                let participants = normalize_payees(&inbound.sender, &mentions).len() as i64;
                (mentions, participants, false)
            }
            ChargeTargets::AllMembers => {
                let members = match self.roster.members(inbound.scope) {
                    Ok(members) => members,
                    Err(err) => {
                        warn!(scope = %inbound.scope, error = %err, "roster lookup failed");
                        return self.renderer.roster_unavailable();
                    }
                };
                let payees: Vec<PartyId> = members
                    .into_iter()
                    .filter(|member| *member != inbound.sender)
                    .collect();
                if payees.is_empty() {
                    return self.renderer.not_enough_participants();
                }
                let participants = payees.len() as i64;
                (payees, participants, true)
            }
        };
        let request = ChargeRequest {
            scope: inbound.scope,
            payer: inbound.sender.clone(),
            payees,
            total,
            reason,
            participants,
        };
        match self.engine.charge(request) {
            Ok(outcome) => self.renderer.charge_reply(total, all_members, &outcome),
            Err(err) => self.renderer.engine_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MasculineDefault;
    use crate::roster::StaticRoster;
    use tally_ledger::MemoryLedgerStore;

    fn dispatcher(members: &[&str]) -> Dispatcher {
        let engine = DebtEngine::new(Arc::new(MemoryLedgerStore::new())).unwrap();
        let roster = StaticRoster::new(members.iter().map(|m| PartyId::new(*m)).collect());
        Dispatcher::new(engine, Arc::new(roster), Renderer::new(Arc::new(MasculineDefault)))
    }

    fn inbound(sender: &str, text: &str) -> Inbound {
        Inbound {
            scope: ScopeId::new(1),
            sender: PartyId::new(sender),
            text: text.to_owned(),
        }
    }

    #[test]
    fn single_charge_then_balance() {
        let dispatcher = dispatcher(&[]);
        let reply = dispatcher
            .dispatch(&inbound("ivan", "@maria 50 обед"))
            .unwrap();
        assert_eq!(reply, "Записан долг: @maria должен @ivan 0.50 за обед");

        let balance = dispatcher.dispatch(&inbound("ivan", "/balance")).unwrap();
        assert!(balance.contains("maria должен ivan 0.50"));
    }

    #[test]
    fn multi_charge_splits_and_lists_each_payee() {
        let dispatcher = dispatcher(&[]);
        let reply = dispatcher
            .dispatch(&inbound("ivan", "@maria @oleg 100 ужин"))
            .unwrap();
        assert!(reply.starts_with("Разделено 1.00 между 2 пользователями (по 0.50 каждый):"));
        assert!(reply.contains("@maria должен @ivan 0.50 за ужин"));
        assert!(reply.contains("@oleg должен @ivan 0.50 за ужин"));
    }

    #[test]
    fn all_members_charge_excludes_the_sender() {
        let dispatcher = dispatcher(&["ivan", "maria", "oleg"]);
        let reply = dispatcher
            .dispatch(&inbound("ivan", "@all 150 вечеринка"))
            .unwrap();
        assert!(reply.starts_with("Разделено 1.50 между 2 участниками (по 0.75 каждый):"));
        assert!(!reply.contains("@ivan должен"));
    }

    #[test]
    fn all_members_needs_someone_besides_the_sender() {
        let dispatcher = dispatcher(&["ivan"]);
        let reply = dispatcher.dispatch(&inbound("ivan", "@all 150")).unwrap();
        assert_eq!(reply, "Недостаточно участников в чате.");
    }

    #[test]
    fn repaying_renders_a_return() {
        let dispatcher = dispatcher(&[]);
        dispatcher
            .dispatch(&inbound("maria", "@ivan 100"))
            .unwrap();
        let reply = dispatcher
            .dispatch(&inbound("ivan", "@maria 100"))
            .unwrap();
        assert_eq!(reply, "Записан возврат: @ivan вернул @maria 1.00");
    }

    #[test]
    fn cancel_is_author_only() {
        let dispatcher = dispatcher(&[]);
        dispatcher.dispatch(&inbound("ivan", "@maria 50")).unwrap();

        let denied = dispatcher.dispatch(&inbound("maria", "/cancel")).unwrap();
        assert_eq!(denied, "Отменить последнюю операцию может только @ivan.");

        let done = dispatcher.dispatch(&inbound("ivan", "/cancel")).unwrap();
        assert!(done.starts_with("Последняя операция отменена:"));

        let balance = dispatcher.dispatch(&inbound("ivan", "/balance")).unwrap();
        assert_eq!(balance, "В этом чате пока нет записанных долгов.");
    }

    #[test]
    fn unparsable_amount_is_reported() {
        let dispatcher = dispatcher(&[]);
        let reply = dispatcher.dispatch(&inbound("ivan", "@maria 12x")).unwrap();
        assert_eq!(reply, "Не удалось разобрать сумму. Пожалуйста, попробуйте снова.");
    }

    #[test]
    fn charging_only_yourself_records_nothing() {
        let dispatcher = dispatcher(&[]);
        let reply = dispatcher.dispatch(&inbound("ivan", "@ivan 50")).unwrap();
        assert_eq!(reply, "Некому записывать долг.");
        let balance = dispatcher.dispatch(&inbound("ivan", "/balance")).unwrap();
        assert_eq!(balance, "В этом чате пока нет записанных долгов.");
    }

    #[test]
    fn plain_chatter_is_ignored() {
        let dispatcher = dispatcher(&[]);
        assert_eq!(dispatcher.dispatch(&inbound("ivan", "когда обед?")), None);
    }

    #[test]
    fn personal_balance_filters_to_the_sender() {
        let dispatcher = dispatcher(&[]);
        dispatcher.dispatch(&inbound("ivan", "@maria 50")).unwrap();
        dispatcher.dispatch(&inbound("oleg", "@anna 30")).unwrap();

        let personal = dispatcher
            .dispatch(&inbound("maria", "/balance me"))
            .unwrap();
        assert!(personal.contains("maria должен ivan 0.50"));
        assert!(!personal.contains("anna"));
    }
}
