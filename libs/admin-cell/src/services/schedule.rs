use std::collections::BTreeSet;

use tracing::{debug, info};

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;

use crate::models::{
    AdminActionResponse, DayOption, DoctorScheduleResponse, ScheduleChip, ScheduleIds, ScheduleView, TimeOption,
};

pub struct ScheduleService {
    backend: BackendClient,
}

impl ScheduleService {
    pub fn new(config: &PortalConfig) -> Self {
        Self { backend: BackendClient::new(config) }
    }

    pub async fn load(&self, doctor_id: i64, auth_token: &str) -> Result<ScheduleEditor, AppError> {
        let response: DoctorScheduleResponse = self
            .backend
            .get(&format!("admin/doctors/{}/schedule/", doctor_id), Some(auth_token))
            .await?;
        Ok(ScheduleEditor::from_response(doctor_id, response))
    }

    /// Overwrites the doctor's whole schedule with `schedule`.
    pub async fn save(&self, doctor_id: i64, schedule: &ScheduleIds, auth_token: &str) -> Result<(), AppError> {
        debug!(
            "Saving schedule for doctor {}: {} days, {} times",
            doctor_id,
            schedule.day_ids.len(),
            schedule.time_ids.len()
        );

        let _: AdminActionResponse = self
            .backend
            .put(&format!("admin/doctors/{}/schedule/", doctor_id), schedule, Some(auth_token))
            .await?;

        info!("Schedule saved for doctor {}", doctor_id);
        Ok(())
    }
}

/// A doctor's weekly availability being edited. Toggles are local; only
/// [`ScheduleEditor::to_update`] leaves the editor.
#[derive(Debug, Clone)]
pub struct ScheduleEditor {
    doctor_id: i64,
    doctor_name: String,
    days: Vec<DayOption>,
    times: Vec<TimeOption>,
    selected_days: BTreeSet<i64>,
    selected_times: BTreeSet<i64>,
}

impl ScheduleEditor {
    pub fn from_response(doctor_id: i64, response: DoctorScheduleResponse) -> Self {
        Self {
            doctor_id,
            doctor_name: response.doctor_name,
            days: response.all_options.days,
            times: response.all_options.times,
            selected_days: response.current_schedule.day_ids.into_iter().collect(),
            selected_times: response.current_schedule.time_ids.into_iter().collect(),
        }
    }

    pub fn doctor_id(&self) -> i64 {
        self.doctor_id
    }

    /// Flips a day in or out of the schedule. Returns whether it is now
    /// selected, or `None` for an id that is not one of the options.
    pub fn toggle_day(&mut self, day_id: i64) -> Option<bool> {
        if !self.days.iter().any(|d| d.id == day_id) {
            return None;
        }
        Some(toggle(&mut self.selected_days, day_id))
    }

    pub fn toggle_time(&mut self, time_id: i64) -> Option<bool> {
        if !self.times.iter().any(|t| t.id == time_id) {
            return None;
        }
        Some(toggle(&mut self.selected_times, time_id))
    }

    /// The complete selection, never a delta.
    pub fn to_update(&self) -> ScheduleIds {
        ScheduleIds {
            day_ids: self.selected_days.iter().copied().collect(),
            time_ids: self.selected_times.iter().copied().collect(),
        }
    }

    pub fn view(&self) -> ScheduleView {
        ScheduleView {
            doctor_id: self.doctor_id,
            doctor_name: self.doctor_name.clone(),
            days: self
                .days
                .iter()
                .map(|d| ScheduleChip {
                    id: d.id,
                    label: d.name.clone(),
                    selected: self.selected_days.contains(&d.id),
                })
                .collect(),
            times: self
                .times
                .iter()
                .map(|t| ScheduleChip {
                    id: t.id,
                    label: t.label().to_string(),
                    selected: self.selected_times.contains(&t.id),
                })
                .collect(),
        }
    }
}

fn toggle(set: &mut BTreeSet<i64>, id: i64) -> bool {
    if set.remove(&id) {
        false
    } else {
        set.insert(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn editor() -> ScheduleEditor {
        let response: DoctorScheduleResponse = serde_json::from_value(json!({
            "doctor_name": "Dr. Heart",
            "all_options": {
                "days": [{ "id": 1, "name": "Monday" }, { "id": 2, "name": "Tuesday" }, { "id": 3, "name": "Wednesday" }],
                "times": [{ "id": 10, "time": "09:00:00" }, { "id": 11, "time": "10:00:00" }]
            },
            "current_schedule": { "day_ids": [3, 1], "time_ids": [10] }
        }))
        .unwrap();
        ScheduleEditor::from_response(4, response)
    }

    #[test]
    fn toggles_flip_membership() {
        let mut editor = editor();

        assert_eq!(editor.toggle_day(1), Some(false));
        assert_eq!(editor.toggle_day(2), Some(true));
        assert_eq!(editor.toggle_time(11), Some(true));
        assert_eq!(editor.toggle_time(10), Some(false));
        assert_eq!(editor.toggle_day(99), None);

        assert_eq!(editor.to_update(), ScheduleIds { day_ids: vec![2, 3], time_ids: vec![11] });
    }

    #[test]
    fn double_toggle_restores_selection() {
        let mut editor = editor();
        let before = editor.to_update();
        editor.toggle_time(11);
        editor.toggle_time(11);
        assert_eq!(editor.to_update(), before);
    }

    #[test]
    fn view_marks_selected_chips() {
        let view = editor().view();
        assert_eq!(view.doctor_name, "Dr. Heart");
        assert!(view.days[0].selected);
        assert!(!view.days[1].selected);
        assert_eq!(view.times[0].label, "09:00");
        assert!(view.times[0].selected);
    }
}
