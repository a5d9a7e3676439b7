use serde::{Deserialize, Serialize};

use crate::timer::{TimerController, TimerPhase, MAX_PHASE_SECONDS};

const SECONDS_PER_MINUTE: i64 = 60;

/// Form-facing view of one phase: duration split into minutes and seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseEditor {
    pub id: String,
    pub label: String,
    pub minutes: u32,
    pub seconds: u32,
    /// Seconds cannot be edited once the minutes alone reach the cap.
    pub seconds_enabled: bool,
}

impl From<&TimerPhase> for PhaseEditor {
    fn from(phase: &TimerPhase) -> Self {
        let total = phase.duration_seconds.min(MAX_PHASE_SECONDS);
        let (minutes, seconds) = split_duration(total);
        Self {
            id: phase.id.clone(),
            label: phase.label.clone(),
            minutes,
            seconds,
            seconds_enabled: minutes < MAX_PHASE_SECONDS / 60,
        }
    }
}

/// Clamp a minutes/seconds request to `[0, MAX_PHASE_SECONDS]`.
pub fn clamp_duration(minutes: i64, seconds: i64) -> u32 {
    let total = minutes
        .saturating_mul(SECONDS_PER_MINUTE)
        .saturating_add(seconds);
    total.clamp(0, i64::from(MAX_PHASE_SECONDS)) as u32
}

pub fn split_duration(total: u32) -> (u32, u32) {
    (total / 60, total % 60)
}

/// Phase settings editor. The timer session holds the only copy of the phase
/// pair; every edit goes straight into it, so the idle display follows the
/// form immediately. Nothing is persisted.
pub struct SettingsStore {
    timer: TimerController,
}

impl SettingsStore {
    pub fn new(timer: TimerController) -> Self {
        Self { timer }
    }

    pub async fn phases(&self) -> [TimerPhase; 2] {
        self.timer.phases().await
    }

    pub async fn editor(&self, id: &str) -> Option<PhaseEditor> {
        self.timer
            .phases()
            .await
            .iter()
            .find(|phase| phase.id == id)
            .map(PhaseEditor::from)
    }

    /// Store a new duration for `id`, clamped to the 15 minute cap, and return
    /// the normalized editor values.
    pub async fn set_duration(&self, id: &str, minutes: i64, seconds: i64) -> Option<PhaseEditor> {
        let total = clamp_duration(minutes, seconds);
        let stored = self
            .timer
            .edit_phase(id, |phase| phase.duration_seconds = total)
            .await?;
        Some(PhaseEditor::from(&stored))
    }

    pub async fn set_label(&self, id: &str, text: &str) -> Option<PhaseEditor> {
        let stored = self
            .timer
            .edit_phase(id, |phase| phase.label = text.to_string())
            .await?;
        Some(PhaseEditor::from(&stored))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::timer::default_phases;

    fn store() -> (SettingsStore, TimerController) {
        let timer = TimerController::new(default_phases(), Duration::from_secs(1));
        (SettingsStore::new(timer.clone()), timer)
    }

    #[test]
    fn durations_over_the_cap_clamp_to_900() {
        for (m, s) in [(15, 1), (16, 30), (20, 0), (0, 901), (100, 59), (i64::MAX, 5)] {
            assert_eq!(clamp_duration(m, s), 900, "{m}:{s}");
        }
    }

    #[test]
    fn negative_input_clamps_to_zero() {
        assert_eq!(clamp_duration(-1, 0), 0);
        assert_eq!(clamp_duration(0, -30), 0);
    }

    #[test]
    fn valid_durations_round_trip() {
        for d in 0..=900i64 {
            let total = clamp_duration(d / 60, d % 60);
            assert_eq!(i64::from(total), d);
        }
    }

    #[tokio::test]
    async fn set_duration_normalizes_and_reaches_the_timer() {
        let (store, timer) = store();

        let editor = store.set_duration("focus", 16, 30).await.unwrap();
        assert_eq!((editor.minutes, editor.seconds), (15, 0));
        assert!(!editor.seconds_enabled);

        assert_eq!(store.phases().await[0].duration_seconds, 900);
        assert_eq!(timer.phases().await[0].duration_seconds, 900);
        assert_eq!(timer.get_snapshot().await.remaining_seconds, 900);
    }

    #[tokio::test]
    async fn seconds_spill_into_minutes() {
        let (store, timer) = store();
        let editor = store.set_duration("rest", 2, 75).await.unwrap();
        assert_eq!((editor.minutes, editor.seconds), (3, 15));
        assert!(editor.seconds_enabled);
        assert_eq!(timer.phases().await[1].duration_seconds, 195);
    }

    #[tokio::test]
    async fn set_label_is_forwarded_verbatim() {
        let (store, timer) = store();
        store.set_label("rest", "  breathe ").await.unwrap();
        assert_eq!(timer.phases().await[1].label, "  breathe ");
        assert_eq!(store.editor("rest").await.unwrap().label, "  breathe ");
    }

    #[tokio::test]
    async fn editor_reflects_updates_made_on_the_timer() {
        let (store, timer) = store();
        timer
            .update_phase(TimerPhase::new("rest", "NAP", 125))
            .await;

        let editor = store.editor("rest").await.unwrap();
        assert_eq!(editor.label, "NAP");
        assert_eq!((editor.minutes, editor.seconds), (2, 5));
        assert_eq!(store.phases().await[1].duration_seconds, 125);
    }

    #[tokio::test]
    async fn edits_keep_the_other_field() {
        let (store, timer) = store();
        store.set_label("focus", "STUDY").await.unwrap();
        store.set_duration("focus", 1, 0).await.unwrap();
        assert_eq!(timer.phases().await[0], TimerPhase::new("focus", "STUDY", 60));
    }

    #[tokio::test]
    async fn unknown_id_changes_nothing() {
        let (store, timer) = store();
        assert!(store.set_duration("nap", 1, 0).await.is_none());
        assert_eq!(timer.phases().await, default_phases());
        assert!(store.editor("nap").await.is_none());
    }

    #[tokio::test]
    async fn editor_for_default_phase() {
        let (store, _) = store();
        let editor = store.editor("focus").await.unwrap();
        assert_eq!(editor.label, "WISDOM");
        assert_eq!((editor.minutes, editor.seconds), (10, 0));
        assert!(editor.seconds_enabled);
    }
}
