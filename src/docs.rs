use crate::api::attendance::{ClockRequest, ClockSettings, GeoLocation, IdentifyRequest};
use crate::api::dashboard::{DashboardStats, DayBreakdown, DepartmentHeadcount};
use crate::api::department::CreateDepartment;
use crate::api::employee::{CreateEmployee, RegisterFace, UpdateEmployee};
use crate::api::leave_request::{CreateLeave, ProcessLeave};
use crate::api::outlet::{CreateOutlet, ShiftInput, UpdateOutlet};
use crate::api::payroll::CreateIncentive;
use crate::api::scan::{CreateScan, ScanFrame};
use crate::face::matcher::FaceMatch;
use crate::face::session::ScanState;
use crate::model::attendance::{Attendance, AttendanceDetail, AttendanceStatus};
use crate::model::department::Department;
use crate::model::employee::{Employee, EmployeeDetail};
use crate::model::leave_request::{LeaveRequest, LeaveRequestDetail, LeaveStatus, LeaveType};
use crate::model::outlet::{Outlet, Shift};
use crate::model::payroll::{IncentiveType, PayrollIncentive, PayrollRow};
use crate::model::setting::Settings;
use crate::models::{LoginReq, LoginResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRIS API",
        version = "1.0.0",
        description = r#"
## HR information system with GPS + face-recognition attendance

Employee records, outlet/shift management, geofenced clock-in/out with
face identification, monthly payroll aggregation, leave requests and an
admin dashboard.

Kiosk routes (clock, scan, identify, employee roster, settings) are open;
admin routes require the **JWT Bearer** token issued by `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::today,
        crate::api::attendance::list,
        crate::api::attendance::report,
        crate::api::attendance::identify,

        crate::api::scan::create_session,
        crate::api::scan::submit_frame,
        crate::api::scan::restart_session,
        crate::api::scan::cancel_session,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::register_face,

        crate::api::department::list_departments,
        crate::api::department::create_department,

        crate::api::outlet::list_outlets,
        crate::api::outlet::create_outlet,
        crate::api::outlet::update_outlet,
        crate::api::outlet::delete_outlet,

        crate::api::payroll::monthly_payroll,
        crate::api::payroll::create_incentive,
        crate::api::payroll::delete_incentive,

        crate::api::leave_request::list_leave_requests,
        crate::api::leave_request::create_leave_request,
        crate::api::leave_request::process_leave_request,
        crate::api::leave_request::delete_leave_request,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings,

        crate::api::dashboard::dashboard,
    ),
    components(
        schemas(
            LoginReq,
            LoginResponse,
            GeoLocation,
            ClockSettings,
            ClockRequest,
            IdentifyRequest,
            CreateScan,
            ScanFrame,
            ScanState,
            FaceMatch,
            Attendance,
            AttendanceDetail,
            AttendanceStatus,
            Employee,
            EmployeeDetail,
            CreateEmployee,
            UpdateEmployee,
            RegisterFace,
            Department,
            CreateDepartment,
            Outlet,
            Shift,
            CreateOutlet,
            UpdateOutlet,
            ShiftInput,
            PayrollRow,
            PayrollIncentive,
            IncentiveType,
            CreateIncentive,
            LeaveRequest,
            LeaveRequestDetail,
            LeaveType,
            LeaveStatus,
            CreateLeave,
            ProcessLeave,
            Settings,
            DashboardStats,
            DayBreakdown,
            DepartmentHeadcount,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Admin session"),
        (name = "Attendance", description = "Clock-in/out and attendance queries"),
        (name = "Scan", description = "Face recognition scan sessions"),
        (name = "Employee", description = "Employee management"),
        (name = "Department", description = "Departments"),
        (name = "Outlet", description = "Outlets and shifts"),
        (name = "Payroll", description = "Monthly payroll and incentives"),
        (name = "Leave", description = "Leave requests"),
        (name = "Settings", description = "Company settings"),
        (name = "Dashboard", description = "Admin dashboard"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
