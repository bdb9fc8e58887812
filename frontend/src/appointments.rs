//! 预约表单与预约列表
//!
//! 表单校验在本地完成，校验失败不会发起网络请求。

use crate::error::FormError;
use medisight_shared::chrono::NaiveDate;
use medisight_shared::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, DashboardStats, UserStats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doctor {
    pub name: &'static str,
    pub specialty: &'static str,
}

impl Doctor {
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.specialty)
    }
}

pub const DOCTORS: [Doctor; 4] = [
    Doctor {
        name: "Dr. Sarah Johnson",
        specialty: "Dermatologist",
    },
    Doctor {
        name: "Dr. Michael Chen",
        specialty: "Ophthalmologist",
    },
    Doctor {
        name: "Dr. Emily Williams",
        specialty: "General Physician",
    },
    Doctor {
        name: "Dr. James Brown",
        specialty: "Dermatologist",
    },
];

pub const TIME_SLOTS: [&str; 8] = [
    "09:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "02:00 PM", "03:00 PM", "04:00 PM",
    "05:00 PM",
];

pub const DEFAULT_CLINIC_NAME: &str = "MediSight Health Center";

/// 预约表单的原始输入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    /// `DOCTORS` 中的下标
    pub doctor: Option<usize>,
    /// `YYYY-MM-DD`，来自 date 输入框
    pub date: String,
    pub time: String,
    pub clinic_name: String,
    pub notes: String,
}

impl BookingForm {
    pub fn doctor(&self) -> Option<&'static Doctor> {
        self.doctor.and_then(|i| DOCTORS.get(i))
    }

    /// 校验必填项与日期，返回可提交的请求
    pub fn to_request(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<CreateAppointmentRequest, FormError> {
        let doctor = self.doctor();
        let date = self.date.trim();
        let time = self.time.trim();
        let (Some(doctor), false, false) = (doctor, date.is_empty(), time.is_empty()) else {
            return Err(FormError::MissingRequiredFields);
        };

        let day =
            NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| FormError::InvalidDate)?;
        if day < today {
            return Err(FormError::DateInPast);
        }
        if !TIME_SLOTS.contains(&time) {
            return Err(FormError::MissingRequiredFields);
        }

        let clinic_name = match self.clinic_name.trim() {
            "" => DEFAULT_CLINIC_NAME.to_string(),
            name => name.to_string(),
        };
        let notes = self.notes.trim();

        Ok(CreateAppointmentRequest {
            user_id: user_id.to_string(),
            doctor_name: doctor.name.to_string(),
            specialty: doctor.specialty.to_string(),
            clinic_name,
            date: day.format("%Y-%m-%d").to_string(),
            time: time.to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

pub fn is_upcoming(appointment: &Appointment, today: NaiveDate) -> bool {
    appointment.status == AppointmentStatus::Scheduled
        && appointment.parsed_date().is_some_and(|d| d >= today)
}

/// 未来的预约，按日期升序
pub fn upcoming(appointments: &[Appointment], today: NaiveDate) -> Vec<Appointment> {
    let mut list: Vec<Appointment> = appointments
        .iter()
        .filter(|a| is_upcoming(a, today))
        .cloned()
        .collect();
    list.sort_by(|a, b| a.parsed_date().cmp(&b.parsed_date()));
    list
}

/// 合并扫描统计与预约列表
pub fn merge_dashboard_stats(
    stats: UserStats,
    appointments: &[Appointment],
    today: NaiveDate,
) -> DashboardStats {
    let upcoming = appointments.iter().filter(|a| is_upcoming(a, today)).count();
    DashboardStats {
        total_scans: stats.total_scans,
        skin_scans: stats.skin_scans,
        eye_scans: stats.eye_scans,
        total_appointments: appointments.len() as u32,
        upcoming_appointments: upcoming as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn filled() -> BookingForm {
        BookingForm {
            doctor: Some(1),
            date: "2025-06-10".to_string(),
            time: "10:00 AM".to_string(),
            clinic_name: String::new(),
            notes: "  blurry vision ".to_string(),
        }
    }

    fn appointment(id: &str, date: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: id.to_string(),
            doctor_name: "Dr. Emily Williams".to_string(),
            specialty: "General Physician".to_string(),
            clinic_name: DEFAULT_CLINIC_NAME.to_string(),
            date: date.to_string(),
            time: "09:00 AM".to_string(),
            status,
            notes: None,
        }
    }

    #[test]
    fn catalogue_matches_booking_options() {
        assert_eq!(DOCTORS.len(), 4);
        assert_eq!(DOCTORS[1].label(), "Dr. Michael Chen - Ophthalmologist");
        assert_eq!(TIME_SLOTS.first(), Some(&"09:00 AM"));
        assert_eq!(TIME_SLOTS.last(), Some(&"05:00 PM"));
    }

    #[test]
    fn complete_form_builds_request() {
        let req = filled().to_request("u1", today()).unwrap();
        assert_eq!(req.user_id, "u1");
        assert_eq!(req.doctor_name, "Dr. Michael Chen");
        assert_eq!(req.specialty, "Ophthalmologist");
        assert_eq!(req.clinic_name, DEFAULT_CLINIC_NAME);
        assert_eq!(req.date, "2025-06-10");
        assert_eq!(req.notes.as_deref(), Some("blurry vision"));
    }

    #[test]
    fn missing_fields_are_rejected() {
        for form in [
            BookingForm {
                doctor: None,
                ..filled()
            },
            BookingForm {
                date: " ".to_string(),
                ..filled()
            },
            BookingForm {
                time: String::new(),
                ..filled()
            },
        ] {
            assert_eq!(
                form.to_request("u1", today()),
                Err(FormError::MissingRequiredFields)
            );
        }
        assert_eq!(
            FormError::MissingRequiredFields.to_string(),
            "Please fill in all required fields"
        );
    }

    #[test]
    fn past_and_malformed_dates_are_rejected() {
        let past = BookingForm {
            date: "2025-05-31".to_string(),
            ..filled()
        };
        assert_eq!(past.to_request("u1", today()), Err(FormError::DateInPast));

        let same_day = BookingForm {
            date: "2025-06-01".to_string(),
            ..filled()
        };
        assert!(same_day.to_request("u1", today()).is_ok());

        let garbage = BookingForm {
            date: "next week".to_string(),
            ..filled()
        };
        assert_eq!(garbage.to_request("u1", today()), Err(FormError::InvalidDate));
    }

    #[test]
    fn upcoming_filters_and_sorts() {
        let list = vec![
            appointment("a", "2025-07-01", AppointmentStatus::Scheduled),
            appointment("b", "2025-06-02", AppointmentStatus::Scheduled),
            appointment("c", "2025-05-01", AppointmentStatus::Scheduled),
            appointment("d", "2025-08-01", AppointmentStatus::Cancelled),
            appointment("e", "bad", AppointmentStatus::Scheduled),
        ];
        let ids: Vec<String> = upcoming(&list, today()).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn dashboard_merge_counts_upcoming_only() {
        let stats = UserStats {
            total_scans: 5,
            skin_scans: 3,
            eye_scans: 2,
        };
        let list = vec![
            appointment("a", "2030-01-01", AppointmentStatus::Scheduled),
            appointment("b", "2020-01-01", AppointmentStatus::Completed),
        ];
        let merged = merge_dashboard_stats(stats, &list, today());
        assert_eq!(
            merged,
            DashboardStats {
                total_scans: 5,
                skin_scans: 3,
                eye_scans: 2,
                total_appointments: 2,
                upcoming_appointments: 1,
            }
        );
    }
}
