// src/models/schedule.rs

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// Mapeia o CREATE TYPE weekday (a ordem da declaração é a ordem da semana)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "weekday", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Lunes,
    Martes,
    Miercoles,
    Jueves,
    Viernes,
    Sabado,
    Domingo,
}

impl Weekday {
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Dono do horário: filial ou usuário. Cada um tem sua tabela.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOwner {
    Subsidiary,
    User,
}

impl ScheduleOwner {
    pub fn table(self) -> &'static str {
        match self {
            ScheduleOwner::Subsidiary => "schedule_subsidiaries",
            ScheduleOwner::User => "schedule_users",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            ScheduleOwner::Subsidiary => "subsidiary_id",
            ScheduleOwner::User => "user_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScheduleOwner::Subsidiary => "Horário da filial",
            ScheduleOwner::User => "Horário do usuário",
        }
    }
}

// ScheduleSubsidiary / ScheduleUser (owner_id = subsidiary_id ou user_id)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub start_day: Weekday,
    pub end_day: Weekday,
    #[schema(value_type = String, example = "08:00:00")]
    pub opening_hour: NaiveTime,
    #[schema(value_type = String, example = "18:00:00")]
    pub closing_hour: NaiveTime,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Janela de disponibilidade já validada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWindow {
    pub start_day: Weekday,
    pub end_day: Weekday,
    #[schema(value_type = String, example = "08:00:00")]
    pub opening_hour: NaiveTime,
    #[schema(value_type = String, example = "18:00:00")]
    pub closing_hour: NaiveTime,
}

impl ScheduleWindow {
    /// `opening_hour < closing_hour` e `start_day` não pode vir depois de `end_day`.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.opening_hour >= self.closing_hour {
            return Err(AppError::field(
                "closingHour",
                "hour_order",
                "O horário de fechamento deve ser posterior ao de abertura.",
            ));
        }
        if self.start_day.index() > self.end_day.index() {
            return Err(AppError::field(
                "endDay",
                "day_order",
                "O dia final não pode ser anterior ao dia inicial.",
            ));
        }
        Ok(())
    }
}

// O payload de criação e de atualização é a própria janela
pub type SchedulePayload = ScheduleWindow;

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(start: Weekday, end: Weekday, open: NaiveTime, close: NaiveTime) -> ScheduleWindow {
        ScheduleWindow { start_day: start, end_day: end, opening_hour: open, closing_hour: close }
    }

    #[test]
    fn accepts_regular_week() {
        assert!(window(Weekday::Lunes, Weekday::Viernes, hm(8, 0), hm(18, 0)).validate().is_ok());
        // Um único dia também é válido
        assert!(window(Weekday::Sabado, Weekday::Sabado, hm(9, 0), hm(13, 30)).validate().is_ok());
    }

    #[test]
    fn rejects_inverted_or_empty_hours() {
        let err = window(Weekday::Lunes, Weekday::Viernes, hm(18, 0), hm(8, 0)).validate();
        assert!(matches!(err, Err(AppError::ValidationError(_))));
        let err = window(Weekday::Lunes, Weekday::Viernes, hm(8, 0), hm(8, 0)).validate();
        assert!(matches!(err, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn rejects_inverted_days() {
        let err = window(Weekday::Domingo, Weekday::Lunes, hm(8, 0), hm(18, 0)).validate();
        assert!(matches!(err, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn week_order_follows_declaration() {
        assert_eq!(Weekday::Lunes.index(), 0);
        assert_eq!(Weekday::Domingo.index(), 6);
        assert!(Weekday::Miercoles < Weekday::Jueves);
    }

    #[test]
    fn payload_parses_wire_format() {
        let w: ScheduleWindow = serde_json::from_str(
            r#"{"startDay":"LUNES","endDay":"VIERNES","openingHour":"08:00:00","closingHour":"17:30:00"}"#,
        )
        .unwrap();
        assert_eq!(w.closing_hour, hm(17, 30));
        assert!(w.validate().is_ok());
    }
}
