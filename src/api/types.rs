use serde::{Deserialize, Serialize};

/// Exhaustive weekly availability as stored by the backend.
/// Every day carries one record per slot, available or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    pub partner_id: String,
    pub schedule: Vec<DaySchedule>,
    pub slot_duration_minutes: u16,
    #[serde(default)]
    pub buffer_time_minutes: u16,
    #[serde(default)]
    pub max_advance_booking_days: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub day_name: String,
    pub is_enabled: bool,
    pub slots: Vec<SlotRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

impl WeeklySchedule {
    pub fn slot_record_count(&self) -> usize {
        self.schedule.iter().map(|day| day.slots.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_wire_shape() {
        let json = r#"{
            "partnerId": "p-17",
            "schedule": [
                { "dayOfWeek": 1, "dayName": "Monday", "isEnabled": true,
                  "slots": [ { "startTime": "09:00", "endTime": "09:30", "isAvailable": true } ] }
            ],
            "slotDurationMinutes": 30,
            "bufferTimeMinutes": 15,
            "maxAdvanceBookingDays": 14
        }"#;
        let schedule: WeeklySchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.partner_id, "p-17");
        assert_eq!(schedule.schedule[0].day_of_week, 1);
        assert!(schedule.schedule[0].slots[0].is_available);
        assert_eq!(schedule.buffer_time_minutes, 15);
        assert_eq!(schedule.slot_record_count(), 1);
    }

    #[test]
    fn missing_metadata_defaults_to_zero() {
        let json = r#"{ "partnerId": "p", "schedule": [], "slotDurationMinutes": 60 }"#;
        let schedule: WeeklySchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.buffer_time_minutes, 0);
        assert_eq!(schedule.max_advance_booking_days, 0);
    }

    #[test]
    fn encodes_camel_case_keys() {
        let record = SlotRecord {
            start_time: "23:30".to_string(),
            end_time: "24:00".to_string(),
            is_available: false,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["startTime"], "23:30");
        assert_eq!(value["endTime"], "24:00");
        assert_eq!(value["isAvailable"], false);
    }
}
