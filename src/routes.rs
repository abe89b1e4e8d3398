use crate::{api, auth::handlers, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let clock_limiter = Arc::new(build_limiter(config.rate_clock_per_min));
    let api_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // One tree for kiosk and admin routes; admin handlers authenticate via
    // the AuthUser extractor, kiosk routes take no token.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter)
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::get().to(api::attendance::list)),
                    )
                    .service(
                        web::resource("/clock-in")
                            .wrap(clock_limiter.clone())
                            .route(web::post().to(api::attendance::clock_in)),
                    )
                    .service(
                        web::resource("/clock-out")
                            .wrap(clock_limiter.clone())
                            .route(web::post().to(api::attendance::clock_out)),
                    )
                    .service(web::resource("/today").route(web::get().to(api::attendance::today)))
                    .service(web::resource("/report").route(web::get().to(api::attendance::report)))
                    .service(
                        web::resource("/identify")
                            .wrap(clock_limiter.clone())
                            .route(web::post().to(api::attendance::identify)),
                    )
                    .service(
                        web::scope("/scan")
                            .service(
                                web::resource("")
                                    .route(web::post().to(api::scan::create_session)),
                            )
                            .service(
                                web::resource("/{id}/frame")
                                    .wrap(clock_limiter.clone())
                                    .route(web::post().to(api::scan::submit_frame)),
                            )
                            .service(
                                web::resource("/{id}/restart")
                                    .route(web::post().to(api::scan::restart_session)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .route(web::delete().to(api::scan::cancel_session)),
                            ),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(api::employee::list_employees))
                            .route(web::post().to(api::employee::create_employee)),
                    )
                    .service(
                        web::resource("/{id}/face")
                            .route(web::post().to(api::employee::register_face)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(api::employee::get_employee))
                            .route(web::put().to(api::employee::update_employee))
                            .route(web::delete().to(api::employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/outlets")
                    .service(
                        web::resource("")
                            .route(web::get().to(api::outlet::list_outlets))
                            .route(web::post().to(api::outlet::create_outlet)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(api::outlet::update_outlet))
                            .route(web::delete().to(api::outlet::delete_outlet)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    .service(
                        web::resource("").route(web::get().to(api::payroll::monthly_payroll)),
                    )
                    .service(
                        web::resource("/incentive")
                            .route(web::post().to(api::payroll::create_incentive)),
                    )
                    .service(
                        web::resource("/incentive/{id}")
                            .route(web::delete().to(api::payroll::delete_incentive)),
                    ),
            )
            .service(
                web::scope("/leave-requests")
                    .service(
                        web::resource("")
                            .route(web::get().to(api::leave_request::list_leave_requests))
                            .route(web::post().to(api::leave_request::create_leave_request)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::patch().to(api::leave_request::process_leave_request))
                            .route(web::delete().to(api::leave_request::delete_leave_request)),
                    ),
            )
            .service(
                web::resource("/departments")
                    .route(web::get().to(api::department::list_departments))
                    .route(web::post().to(api::department::create_department)),
            )
            .service(
                web::resource("/settings")
                    .route(web::get().to(api::settings::get_settings))
                    .route(web::put().to(api::settings::update_settings)),
            )
            .service(web::resource("/dashboard").route(web::get().to(api::dashboard::dashboard))),
    );
}
