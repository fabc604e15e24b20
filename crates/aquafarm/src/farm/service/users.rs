use tracing::info;

use super::{
    next_id, required_email, required_text, same_text, FarmError, FarmService, USER_SEQUENCE,
};
use crate::config::AdminSeed;
use crate::farm::access::{AccessError, Actor, Permission};
use crate::farm::domain::{CompanyId, CompanyStatus, Profile, UserId, UserRole};
use crate::farm::repository::FarmRepository;
use crate::farm::requests::NewUser;

impl<R> FarmService<R>
where
    R: FarmRepository + 'static,
{
    /// Seed a platform administrator. Calling it again with the same e-mail
    /// returns the existing profile.
    pub fn bootstrap_admin(&self, seed: &AdminSeed) -> Result<Profile, FarmError> {
        let email = required_email(&seed.email, "admin e-mail")?;
        let full_name = required_text(&seed.full_name, "admin name")?;

        if let Some(existing) = self
            .repository
            .profiles(None)?
            .into_iter()
            .find(|profile| same_text(&profile.email, &email))
        {
            if existing.role != UserRole::Admin {
                return Err(FarmError::Conflict(format!(
                    "{email} already belongs to a non-administrator profile"
                )));
            }
            return Ok(existing);
        }

        let profile = self.repository.insert_profile(Profile {
            id: UserId(next_id(&USER_SEQUENCE, "usr")),
            company_id: None,
            full_name,
            email,
            role: UserRole::Admin,
            active: true,
            created_on: self.today(),
        })?;
        info!(user_id = %profile.id, "platform administrator seeded");
        Ok(profile)
    }

    pub fn create_user(&self, actor: &Actor, request: NewUser) -> Result<Profile, FarmError> {
        actor.require(Permission::ManageUsers)?;
        let full_name = required_text(&request.full_name, "full name")?;
        let email = required_email(&request.email, "e-mail")?;

        if request.role == UserRole::Admin && !actor.is_admin() {
            return Err(AccessError::CannotGrant {
                role: actor.role(),
                granted: UserRole::Admin,
            }
            .into());
        }

        let company_id = if request.role == UserRole::Admin {
            None
        } else {
            Some(self.target_company(actor, request.company_id)?)
        };

        self.ensure_email_available(&email)?;

        let profile = self.repository.insert_profile(Profile {
            id: UserId(next_id(&USER_SEQUENCE, "usr")),
            company_id,
            full_name,
            email,
            role: request.role,
            active: true,
            created_on: self.today(),
        })?;

        info!(user_id = %profile.id, role = profile.role.label(), created_by = %actor.id(), "user created");
        Ok(profile)
    }

    pub fn update_role(
        &self,
        actor: &Actor,
        user_id: &UserId,
        role: UserRole,
    ) -> Result<Profile, FarmError> {
        let mut profile = self.managed_profile(actor, user_id)?;

        if role == UserRole::Admin || profile.role == UserRole::Admin {
            return Err(FarmError::Validation(
                "administrator roles are managed at the platform level".to_string(),
            ));
        }
        if profile.role == role {
            return Ok(profile);
        }
        if profile.role == UserRole::Manager && profile.active {
            self.ensure_other_manager(&profile)?;
        }

        profile.role = role;
        self.repository.update_profile(profile.clone())?;
        info!(user_id = %profile.id, role = role.label(), changed_by = %actor.id(), "user role changed");
        Ok(profile)
    }

    pub fn set_active(
        &self,
        actor: &Actor,
        user_id: &UserId,
        active: bool,
    ) -> Result<Profile, FarmError> {
        let mut profile = self.managed_profile(actor, user_id)?;
        if profile.active == active {
            return Ok(profile);
        }
        if !active && profile.role == UserRole::Manager {
            self.ensure_other_manager(&profile)?;
        }

        profile.active = active;
        self.repository.update_profile(profile.clone())?;
        info!(user_id = %profile.id, active, changed_by = %actor.id(), "user access changed");
        Ok(profile)
    }

    /// Profiles visible to the actor, sorted by name. Admins may narrow to one
    /// company.
    pub fn list_users(
        &self,
        actor: &Actor,
        company: Option<&CompanyId>,
    ) -> Result<Vec<Profile>, FarmError> {
        actor.require(Permission::ManageUsers)?;
        let scope = match (actor.scope(), company) {
            (Some(own), Some(requested)) if own != requested => {
                return Err(AccessError::OutsideCompany.into())
            }
            (Some(own), _) => Some(own),
            (None, requested) => requested,
        };

        let mut profiles = self.repository.profiles(scope)?;
        profiles.sort_by(|a, b| {
            a.full_name
                .to_lowercase()
                .cmp(&b.full_name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(profiles)
    }

    /// Company a new user lands in: the manager's own, or the one an admin
    /// names explicitly.
    fn target_company(
        &self,
        actor: &Actor,
        requested: Option<CompanyId>,
    ) -> Result<CompanyId, FarmError> {
        let company_id = match (actor.scope(), requested) {
            (Some(own), Some(requested)) if own != &requested => {
                return Err(AccessError::OutsideCompany.into())
            }
            (Some(own), _) => own.clone(),
            (None, Some(requested)) => requested,
            (None, None) => {
                return Err(FarmError::Validation(
                    "company_id is required for company users".to_string(),
                ))
            }
        };

        let company = self
            .repository
            .fetch_company(&company_id)?
            .ok_or_else(|| FarmError::not_found("company", &company_id))?;
        if company.status == CompanyStatus::Rejected {
            return Err(FarmError::Conflict(format!(
                "company {} was rejected and cannot receive users",
                company.id
            )));
        }
        Ok(company_id)
    }

    /// Target profile of a user-administration call.
    fn managed_profile(&self, actor: &Actor, user_id: &UserId) -> Result<Profile, FarmError> {
        actor.require(Permission::ManageUsers)?;
        if actor.id() == user_id {
            return Err(FarmError::Validation(
                "you cannot change your own role or access".to_string(),
            ));
        }

        let profile = self
            .repository
            .fetch_profile(user_id)?
            .ok_or_else(|| FarmError::not_found("user", user_id))?;

        if !actor.is_admin() {
            match &profile.company_id {
                Some(company_id) => actor.require_company(company_id)?,
                None => return Err(AccessError::OutsideCompany.into()),
            }
        }
        Ok(profile)
    }

    /// A company must keep at least one active manager.
    fn ensure_other_manager(&self, profile: &Profile) -> Result<(), FarmError> {
        let Some(company_id) = &profile.company_id else {
            return Ok(());
        };
        let others = self
            .repository
            .profiles(Some(company_id))?
            .into_iter()
            .filter(|other| {
                other.id != profile.id && other.role == UserRole::Manager && other.active
            })
            .count();
        if others == 0 {
            return Err(FarmError::Conflict(format!(
                "{} is the last active manager of company {company_id}",
                profile.full_name
            )));
        }
        Ok(())
    }
}
