use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};

use crate::{
    api::{dashboard, document, employee, files, leave_request, message, settings},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP rate limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    register: Limiter,
    protected: Limiter,
}

impl Limiters {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            register: build_limiter(config.rate_register_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit: {} per minute", requests_per_min))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Uploaded files are public by URL.
    cfg.route("/files/{path:.*}", web::get().to(files::serve_file));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(limiters.login.clone())
                            .route(web::post().to(handlers::login)),
                    )
                    .service(
                        web::resource("/register")
                            .wrap(limiters.register.clone())
                            .route(web::post().to(handlers::register)),
                    )
                    .service(
                        web::resource("/logout")
                            .wrap(limiters.login.clone())
                            .route(web::post().to(handlers::logout)),
                    ),
            )
            .service(
                web::scope("/public")
                    .route("/settings", web::get().to(settings::public_settings)),
            )
            .service(
                web::scope("/admin")
                    .wrap(from_fn(auth_middleware))
                    .wrap(limiters.protected.clone())
                    .service(
                        web::scope("/employees")
                            // /admin/employees
                            .service(
                                web::resource("")
                                    .route(web::get().to(employee::list_employees))
                                    .route(web::post().to(employee::create_employee)),
                            )
                            .route("/paged", web::get().to(employee::list_employees_paged))
                            // /admin/employees/{id}
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(employee::get_employee))
                                    .route(web::put().to(employee::update_employee))
                                    .route(web::delete().to(employee::delete_employee)),
                            ),
                    )
                    .service(
                        web::scope("/leaves")
                            .route("", web::get().to(leave_request::leave_list))
                            .route("/paged", web::get().to(leave_request::leave_list_paged))
                            .route("/{id}/approve", web::put().to(leave_request::approve_leave))
                            .route("/{id}/reject", web::put().to(leave_request::reject_leave)),
                    )
                    .service(
                        web::scope("/document-types")
                            .service(
                                web::resource("")
                                    .route(web::get().to(document::list_types))
                                    .route(web::post().to(document::create_type)),
                            )
                            .route("/paged", web::get().to(document::list_types_paged))
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(document::get_type))
                                    .route(web::put().to(document::update_type))
                                    .route(web::delete().to(document::delete_type)),
                            ),
                    )
                    .route("/documents/uploads", web::get().to(document::grouped_uploads))
                    .service(
                        web::scope("/settings")
                            .service(
                                web::resource("")
                                    .route(web::get().to(settings::get_settings))
                                    .route(web::put().to(settings::update_settings)),
                            )
                            .route("/logo", web::post().to(settings::upload_logo))
                            .route("/landing-image", web::post().to(settings::upload_landing_image)),
                    )
                    .route("/dashboard", web::get().to(dashboard::admin_dashboard)),
            )
            .service(
                web::scope("/employee")
                    .wrap(from_fn(auth_middleware))
                    .wrap(limiters.protected.clone())
                    .service(
                        web::scope("/profile")
                            .service(
                                web::resource("")
                                    .route(web::get().to(employee::my_profile))
                                    .route(web::put().to(employee::upsert_my_profile)),
                            )
                            .route("/photo", web::post().to(employee::upload_photo))
                            .route("/password", web::put().to(employee::change_password)),
                    )
                    .service(
                        web::resource("/leaves")
                            .route(web::get().to(leave_request::my_leaves))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    .service(
                        web::scope("/messages")
                            .route("", web::post().to(message::send_message))
                            .route("/recipients", web::get().to(message::recipients))
                            .route("/inbox", web::get().to(message::inbox))
                            .route("/sent", web::get().to(message::sent))
                            .route("/unread-count", web::get().to(message::unread_count))
                            .route("/thread/by-id/{id}", web::get().to(message::thread_by_message))
                            .route(
                                "/thread/by-thread/{threadId}",
                                web::get().to(message::thread_by_thread),
                            )
                            .route("/{id}/read", web::put().to(message::mark_read))
                            // /employee/messages/{id}
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(message::get_message))
                                    .route(web::delete().to(message::delete_message)),
                            ),
                    )
                    .service(
                        web::scope("/documents")
                            .route("", web::get().to(document::my_documents))
                            .route("/types", web::get().to(document::employee_types))
                            .route("/{typeId}/upload", web::post().to(document::upload_document))
                            .route("/{id}", web::delete().to(document::delete_document)),
                    )
                    .route("/dashboard", web::get().to(dashboard::employee_dashboard)),
            ),
    );
}
