//! Super-admin console: account moderation and platform counts.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::queries;
use sh_models::{Appointment, Database, DatabaseStats, Role, User};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

/// Platform overview shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub users_by_role: BTreeMap<String, i64>,
    pub appointments_by_status: BTreeMap<String, i64>,
    pub inactive_users: i64,
    pub tables: DatabaseStats,
}

#[derive(Clone)]
pub struct AdminService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
    config: ConfigHandle,
}

impl AdminService {
    pub fn new(database: Database, event_bus: EventBus, config: ConfigHandle) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
            config,
        }
    }

    fn ensure_super_admin(&self, actor: &User) -> ShResult<()> {
        if !actor.is_super_admin(&self.config.snapshot()) {
            return Err(ShError::Forbidden("administrator access required".into()));
        }
        Ok(())
    }

    /// Accounts in registration order, optionally narrowed to one role.
    pub fn list_users(&self, actor: &User, role: Option<Role>) -> ShResult<Vec<User>> {
        self.ensure_super_admin(actor)?;
        let conn = self.database.conn()?;
        User::list(&conn, role)
    }

    /// Activate or deactivate an account. Admins cannot deactivate themselves.
    pub fn set_user_active(&self, actor: &User, user_id: &str, active: bool) -> ShResult<User> {
        self.ensure_super_admin(actor)?;
        if actor.id == user_id && !active {
            return Err(ShError::Validation("cannot deactivate your own account".into()));
        }

        let conn = self.database.conn()?;
        let mut user = User::find_by_id(&conn, user_id)?
            .ok_or_else(|| ShError::UserNotFound(user_id.to_string()))?;
        if user.active == active {
            return Ok(user);
        }

        User::set_active(&conn, user_id, active)?;
        user.active = active;
        info!("admin {} set user {user_id} active={active}", actor.id);
        self.event_bus.emit(AppEvent::UserActiveChanged {
            user_id: user_id.to_string(),
            active,
        });
        Ok(user)
    }

    pub fn list_appointments(&self, actor: &User) -> ShResult<Vec<Appointment>> {
        self.ensure_super_admin(actor)?;
        let conn = self.database.conn()?;
        Appointment::list_all(&conn)
    }

    pub fn stats(&self, actor: &User) -> ShResult<AdminStats> {
        self.ensure_super_admin(actor)?;
        let (users_by_role, appointments_by_status, inactive_users) = {
            let conn = self.database.conn()?;
            (
                queries::user_role_counts(&conn)?,
                queries::appointment_status_counts(&conn)?,
                queries::inactive_user_count(&conn)?,
            )
        };
        Ok(AdminStats {
            users_by_role,
            appointments_by_status,
            inactive_users,
            tables: self.database.stats()?,
        })
    }
}

impl Service for AdminService {
    fn name(&self) -> &str {
        "admin"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> ShResult<()> {
        self.state = ServiceState::Running;
        info!("admin service initialized");
        Ok(())
    }
    fn shutdown(&mut self) -> ShResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_core::config::AppConfig;
    use sh_models::{now_timestamp, PasswordRecord};

    fn user(db: &Database, id: &str, role: Role) -> User {
        let user = User {
            id: id.into(),
            name: id.to_uppercase(),
            email: format!("{id}@example.com"),
            role,
            active: true,
            created_at: now_timestamp(),
        };
        let record = PasswordRecord { hash: "h".into(), salt: "s".into(), iterations: 1 };
        user.insert(&db.conn().unwrap(), &record).unwrap();
        user
    }

    fn service(db: &Database, super_admins: &[&str]) -> AdminService {
        let mut config = AppConfig::default();
        config.admin.super_admin_emails = super_admins.iter().map(|s| s.to_string()).collect();
        AdminService::new(db.clone(), EventBus::new(16), ConfigHandle::new(config))
    }

    #[test]
    fn test_access_requires_super_admin() {
        let db = Database::in_memory().unwrap();
        let svc = service(&db, &["Boss@Example.com"]);
        let boss = user(&db, "boss", Role::Patient);
        let root = user(&db, "root", Role::Admin);
        let asha = user(&db, "asha", Role::Patient);

        assert_eq!(svc.list_users(&boss, None).unwrap().len(), 3);
        assert!(svc.list_users(&root, Some(Role::Admin)).is_ok());
        assert!(matches!(svc.list_users(&asha, None), Err(ShError::Forbidden(_))));
        assert!(matches!(svc.stats(&asha), Err(ShError::Forbidden(_))));

        let disabled = User { active: false, ..root };
        assert!(matches!(svc.list_users(&disabled, None), Err(ShError::Forbidden(_))));
    }

    #[test]
    fn test_set_user_active() {
        let db = Database::in_memory().unwrap();
        let svc = service(&db, &[]);
        let root = user(&db, "root", Role::Admin);
        let asha = user(&db, "asha", Role::Patient);
        let mut rx = svc.event_bus.subscribe();

        let updated = svc.set_user_active(&root, &asha.id, false).unwrap();
        assert!(!updated.active);
        assert_eq!(
            rx.try_recv().unwrap(),
            AppEvent::UserActiveChanged { user_id: "asha".into(), active: false }
        );
        // Unchanged state emits nothing.
        svc.set_user_active(&root, &asha.id, false).unwrap();
        assert!(rx.try_recv().is_err());

        assert!(matches!(svc.set_user_active(&root, &root.id, false), Err(ShError::Validation(_))));
        assert!(matches!(svc.set_user_active(&root, "ghost", true), Err(ShError::UserNotFound(_))));
    }

    #[test]
    fn test_stats_counts() {
        let db = Database::in_memory().unwrap();
        let svc = service(&db, &[]);
        let root = user(&db, "root", Role::Admin);
        user(&db, "asha", Role::Patient);
        user(&db, "meera", Role::Patient);
        user(&db, "ravi", Role::Doctor);
        svc.set_user_active(&root, "meera", false).unwrap();

        let stats = svc.stats(&root).unwrap();
        assert_eq!(stats.users_by_role.get("patient"), Some(&2));
        assert_eq!(stats.users_by_role.get("doctor"), Some(&1));
        assert_eq!(stats.inactive_users, 1);
        assert_eq!(stats.tables.doctors, 6);
        assert!(svc.list_appointments(&root).unwrap().is_empty());
    }
}
