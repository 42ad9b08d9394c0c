use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_core::{Money, PartyId};
use tally_engine::{CancelOutcome, ChargeOutcome, EngineError, PairBalance};
use tally_ledger::{DebtEntry, EntryKind};

/// Grammatical gender used to agree verbs with a display name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Masculine,
    Feminine,
}

/// Presentation-time lookup for how a display name agrees grammatically.
/// Consulted only while rendering; the engine below never branches on it.
pub trait GenderSource: Send + Sync {
    fn gender(&self, party: &PartyId) -> Gender;
}

/// Default agreement: masculine for every name.
#[derive(Clone, Copy, Debug, Default)]
pub struct MasculineDefault;

impl GenderSource for MasculineDefault {
    fn gender(&self, _party: &PartyId) -> Gender {
        Gender::Masculine
    }
}

/// Builds the bot's Russian reply strings.
pub struct Renderer {
    gender: Arc<dyn GenderSource>,
}

impl Renderer {
    pub fn new(gender: Arc<dyn GenderSource>) -> Self {
        Self { gender }
    }

    fn owes(&self, party: &PartyId) -> &'static str {
        match self.gender.gender(party) {
            Gender::Masculine => "должен",
            Gender::Feminine => "должна",
        }
    }

    fn returned(&self, party: &PartyId) -> &'static str {
        match self.gender.gender(party) {
            Gender::Masculine => "вернул",
            Gender::Feminine => "вернула",
        }
    }

    fn entry_line(&self, entry: &DebtEntry) -> String {
        let mut line = match entry.kind {
            EntryKind::Debt => format!(
                "@{} {} @{} {}",
                entry.to,
                self.owes(&entry.to),
                entry.from,
                entry.amount
            ),
            EntryKind::Return => format!(
                "@{} {} @{} {}",
                entry.from,
                self.returned(&entry.from),
                entry.to,
                entry.amount
            ),
        };
        if let Some(reason) = &entry.reason {
            let _ = write!(line, " за {reason}");
        }
        line
    }

    pub fn charge_reply(&self, total: Money, all_members: bool, outcome: &ChargeOutcome) -> String {
        if outcome.entries.is_empty() {
            return if outcome.share.is_zero() {
                "Сумма слишком мала, чтобы её разделить.".to_owned()
            } else {
                "Некому записывать долг.".to_owned()
            };
        }
        let payees: Vec<&PartyId> = {
            let mut seen: Vec<&PartyId> = Vec::new();
            for entry in &outcome.entries {
                if !seen.contains(&&entry.to) {
                    seen.push(&entry.to);
                }
            }
            seen
        };
        if payees.len() == 1 && outcome.entries.len() == 1 {
            let entry = &outcome.entries[0];
            return match entry.kind {
                EntryKind::Debt => format!("Записан долг: {}", self.entry_line(entry)),
                EntryKind::Return => format!("Записан возврат: {}", self.entry_line(entry)),
            };
        }
        let noun = if all_members {
            "участниками"
        } else {
            "пользователями"
        };
        let mut reply = format!(
            "Разделено {total} между {} {noun} (по {} каждый):\n",
            payees.len(),
            outcome.share
        );
        for entry in &outcome.entries {
            let _ = writeln!(reply, "{}", self.entry_line(entry));
        }
        reply.trim_end().to_owned()
    }

    pub fn balances(&self, balances: &[PairBalance]) -> String {
        if balances.is_empty() {
            return "В этом чате пока нет записанных долгов.".to_owned();
        }
        let mut reply = String::from("Долги в этом чате:\n\n");
        for balance in balances {
            let _ = writeln!(
                reply,
                "{} {} {} {}",
                balance.debtor,
                self.owes(&balance.debtor),
                balance.creditor,
                balance.amount
            );
        }
        reply.trim_end().to_owned()
    }

    pub fn personal_balances(&self, balances: &[PairBalance]) -> String {
        if balances.is_empty() {
            return "У вас нет непогашенных долгов.".to_owned();
        }
        let mut reply = String::from("Ваши долги:\n\n");
        for balance in balances {
            let _ = writeln!(
                reply,
                "{} {} {} {}",
                balance.debtor,
                self.owes(&balance.debtor),
                balance.creditor,
                balance.amount
            );
        }
        reply.trim_end().to_owned()
    }

    pub fn history(&self, days: i64, entries: &[DebtEntry]) -> String {
        if entries.is_empty() {
            return format!("Нет операций за последние {days} дней.");
        }
        let mut reply = format!("История операций за последние {days} дней:\n\n");
        for entry in entries {
            let _ = writeln!(
                reply,
                "[{}] {}",
                format_timestamp(entry.created_at),
                self.entry_line(entry)
            );
        }
        reply.trim_end().to_owned()
    }

    pub fn entries_list(&self, entries: &[DebtEntry]) -> String {
        if entries.is_empty() {
            return "В этом чате пока нет записанных долгов.".to_owned();
        }
        let mut reply = String::from("Текущие записи в этом чате:\n\n");
        for entry in entries {
            let _ = writeln!(reply, "{}", self.entry_line(entry));
        }
        reply.trim_end().to_owned()
    }

    pub fn cancelled(&self, outcome: &CancelOutcome) -> String {
        let mut reply = String::from("Последняя операция отменена:\n\n");
        for entry in &outcome.removed {
            let _ = writeln!(reply, "{}", self.entry_line(entry));
        }
        reply.trim_end().to_owned()
    }

    pub fn engine_error(&self, err: &EngineError) -> String {
        match err {
            EngineError::Ledger(_) => {
                "Ошибка при сохранении долга. Пожалуйста, попробуйте снова.".to_owned()
            }
            EngineError::InvalidParticipants(_) => "Некому записывать долг.".to_owned(),
            EngineError::NoOperations => "Нет операций для отмены.".to_owned(),
            EngineError::NotAuthorized { author } => {
                format!("Отменить последнюю операцию может только @{author}.")
            }
            EngineError::AlreadyCancelled => "Эта операция уже отменена.".to_owned(),
        }
    }

    pub fn invalid_amount(&self) -> String {
        "Не удалось разобрать сумму. Пожалуйста, попробуйте снова.".to_owned()
    }

    pub fn roster_unavailable(&self) -> String {
        "Ошибка при получении списка участников. Пожалуйста, попробуйте снова.".to_owned()
    }

    pub fn not_enough_participants(&self) -> String {
        "Недостаточно участников в чате.".to_owned()
    }

    pub fn unknown_command(&self) -> String {
        "Неизвестная команда".to_owned()
    }

    pub fn start(&self) -> String {
        "Добро пожаловать! Используйте формат '@username сумма [причина]' для записи долга.\n\
         Вы можете указать несколько пользователей, чтобы разделить сумму между ними.\n\
         Используйте @all, чтобы разделить между всеми участниками чата."
            .to_owned()
    }

    pub fn help(&self) -> String {
        "Как пользоваться ботом:\n\
         \n\
         1. Запись долга:\n\
         \u{2022} @username сумма [причина] - записать долг для одного человека\n\
         \u{2022} @user1 @user2 сумма [причина] - разделить сумму между несколькими людьми\n\
         \u{2022} @all сумма [причина] - разделить сумму между всеми участниками чата\n\
         \n\
         2. Команды:\n\
         \u{2022} /balance - показать все долги в чате\n\
         \u{2022} /balance me - показать ваши личные долги\n\
         \u{2022} /history [дней] - показать историю операций (по умолчанию за 1 день)\n\
         \u{2022} /debts - показать все записи в чате\n\
         \u{2022} /cancel - отменить вашу последнюю операцию\n\
         \u{2022} /help - показать это сообщение\n\
         \n\
         Примеры:\n\
         \u{2022} @ivan 50 обед\n\
         \u{2022} @ivan @maria 100 ужин\n\
         \u{2022} @all 150 вечеринка\n\
         \u{2022} /history 30 - показать историю за 30 дней"
            .to_owned()
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d.%m.%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tally_core::ScopeId;

    struct NameSuffixGender;

    impl GenderSource for NameSuffixGender {
        fn gender(&self, party: &PartyId) -> Gender {
            if party.as_str().ends_with('a') {
                Gender::Feminine
            } else {
                Gender::Masculine
            }
        }
    }

    fn entry(from: &str, to: &str, amount: i64, kind: EntryKind) -> DebtEntry {
        DebtEntry {
            scope: ScopeId::new(1),
            from: PartyId::new(from),
            to: PartyId::new(to),
            amount: Money::from_minor(amount),
            reason: Some("обед".to_owned()),
            kind,
            operation_id: 1,
            created_at: Utc.with_ymd_and_hms(2024, 3, 8, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn debt_line_agrees_with_the_debtor() {
        let renderer = Renderer::new(Arc::new(NameSuffixGender));
        let line = renderer.entry_line(&entry("ivan", "maria", 5000, EntryKind::Debt));
        assert_eq!(line, "@maria должна @ivan 50.00 за обед");
    }

    #[test]
    fn return_line_agrees_with_the_payer() {
        let renderer = Renderer::new(Arc::new(NameSuffixGender));
        let line = renderer.entry_line(&entry("maria", "ivan", 2500, EntryKind::Return));
        assert_eq!(line, "@maria вернула @ivan 25.00 за обед");
    }

    #[test]
    fn history_formats_day_first_timestamps() {
        let renderer = Renderer::new(Arc::new(MasculineDefault));
        let reply = renderer.history(7, &[entry("ivan", "oleg", 100, EntryKind::Debt)]);
        assert!(reply.starts_with("История операций за последние 7 дней:"));
        assert!(reply.contains("[08.03.2024 12:30]"));
    }

    #[test]
    fn empty_listings_have_friendly_lines() {
        let renderer = Renderer::new(Arc::new(MasculineDefault));
        assert_eq!(
            renderer.balances(&[]),
            "В этом чате пока нет записанных долгов."
        );
        assert_eq!(renderer.personal_balances(&[]), "У вас нет непогашенных долгов.");
        assert_eq!(renderer.history(3, &[]), "Нет операций за последние 3 дней.");
    }
}
