use crate::{
    api::{admin, attendance, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // per_ms and burst are both clamped to at least 1
        .expect("non-zero governor quota");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let punch_limiter = Arc::new(build_limiter(config.rate_punch_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/time-in, /attendance/time-out
                    .service(
                        web::resource("/time-in")
                            .wrap(punch_limiter.clone())
                            .route(web::post().to(attendance::time_in)),
                    )
                    .service(
                        web::resource("/time-out")
                            .wrap(punch_limiter.clone())
                            .route(web::post().to(attendance::time_out)),
                    )
                    // /attendance/breaks/{coffee,lunch}
                    .service(
                        web::resource("/breaks/coffee")
                            .wrap(punch_limiter.clone())
                            .route(web::post().to(attendance::coffee_break)),
                    )
                    .service(
                        web::resource("/breaks/lunch")
                            .wrap(punch_limiter)
                            .route(web::post().to(attendance::lunch_break)),
                    )
                    .service(
                        web::resource("/current").route(web::get().to(attendance::current_session)),
                    )
                    // /attendance/logs
                    .service(web::resource("/logs").route(web::get().to(attendance::range_logs)))
                    .service(
                        web::resource("/logs/monthly")
                            .route(web::get().to(attendance::monthly_logs)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(web::resource("").route(web::get().to(payroll::list_payrolls)))
                    // /payroll/calculate
                    .service(
                        web::resource("/calculate")
                            .route(web::post().to(payroll::calculate_payroll)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/pay-rates/{user_id}")
                            .route(web::put().to(admin::set_pay_rate)),
                    )
                    .service(
                        web::resource("/payroll-settings")
                            .route(web::put().to(admin::set_payroll_settings)),
                    )
                    .service(
                        web::resource("/locations").route(web::post().to(admin::create_location)),
                    )
                    .service(
                        web::resource("/users/{user_id}/restrictions/{location_id}")
                            .route(web::put().to(admin::set_restriction)),
                    ),
            ),
    );
}
