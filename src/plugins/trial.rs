use async_trait::async_trait;
use chrono::NaiveDate;

use crate::events::{EventEffects, EventHandler, EventType, PluginEvent};
use crate::license::{gate, trial_banner};
use crate::plugins::PluginError;

/// Header message on input screens while the installation is on trial
#[derive(Debug, Clone)]
pub struct TrialBanner {
    plugin_name: String,
    trial_enddate: String,
    today: Option<NaiveDate>,
}

impl TrialBanner {
    pub fn new(plugin_name: impl Into<String>, trial_enddate: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            trial_enddate: trial_enddate.into(),
            today: None,
        }
    }

    /// Pin the date used for the comparison
    pub fn on(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}

#[async_trait]
impl EventHandler for TrialBanner {
    fn name(&self) -> &str {
        "trial_banner"
    }

    fn handles(&self, event_type: EventType) -> bool {
        event_type.is_record_show()
    }

    async fn handle(&self, _event: &PluginEvent) -> Result<EventEffects, PluginError> {
        let today = self.today.unwrap_or_else(gate::today);
        Ok(EventEffects {
            header_messages: trial_banner(&self.plugin_name, &self.trial_enddate, today)
                .into_iter()
                .collect(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[tokio::test]
    async fn test_banner_during_trial_only() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let event = PluginEvent::record(EventType::CreateShow, Record::default());

        let active = TrialBanner::new("一覧アクション", "20261020").on(today);
        let effects = active.handle(&event).await.unwrap();
        assert_eq!(
            effects.header_messages,
            vec!["一覧アクション　お試し期間中（～2026/10/20）".to_string()]
        );

        let expired = TrialBanner::new("一覧アクション", "20261001").on(today);
        assert!(expired.handle(&event).await.unwrap().is_empty());

        let last_day = TrialBanner::new("一覧アクション", "20261016").on(today);
        assert!(last_day.handle(&event).await.unwrap().is_empty());

        let licensed = TrialBanner::new("一覧アクション", "").on(today);
        assert!(licensed.handle(&event).await.unwrap().is_empty());
    }
}
