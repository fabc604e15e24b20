use tracing::{info, warn};

use super::{
    next_id, required_email, required_text, same_text, FarmError, FarmService,
    COMPANY_SEQUENCE, USER_SEQUENCE,
};
use crate::farm::access::{Actor, Permission};
use crate::farm::domain::{Company, CompanyId, CompanyStatus, Profile, UserId, UserRole};
use crate::farm::repository::FarmRepository;
use crate::farm::requests::{CompanyRegistration, CompanyRegistrationReceipt};

impl<R> FarmService<R>
where
    R: FarmRepository + 'static,
{
    /// Register a company and its founding manager. Both wait for platform
    /// approval before anyone can sign in.
    pub fn register_company(
        &self,
        registration: CompanyRegistration,
    ) -> Result<CompanyRegistrationReceipt, FarmError> {
        let name = required_text(&registration.company_name, "company name")?;
        let contact_email = required_email(&registration.contact_email, "contact e-mail")?;
        let manager_name = required_text(&registration.manager_name, "manager name")?;
        let manager_email = required_email(&registration.manager_email, "manager e-mail")?;

        let name_taken = self.repository.companies()?.iter().any(|company| {
            company.status != CompanyStatus::Rejected && same_text(&company.name, &name)
        });
        if name_taken {
            warn!(company = %name, "duplicate company registration");
            return Err(FarmError::Conflict(format!(
                "a company named '{name}' is already registered"
            )));
        }
        self.ensure_email_available(&manager_email)?;

        let today = self.today();
        let company = self.repository.insert_company(Company {
            id: CompanyId(next_id(&COMPANY_SEQUENCE, "cmp")),
            name,
            contact_email,
            status: CompanyStatus::Pending,
            registered_on: today,
            reviewed_by: None,
            reviewed_on: None,
            rejection_reason: None,
        })?;

        let manager = self.repository.insert_profile(Profile {
            id: UserId(next_id(&USER_SEQUENCE, "usr")),
            company_id: Some(company.id.clone()),
            full_name: manager_name,
            email: manager_email,
            role: UserRole::Manager,
            active: false,
            created_on: today,
        })?;

        info!(company_id = %company.id, company = %company.name, "company registration received");
        Ok(CompanyRegistrationReceipt { company, manager })
    }

    pub fn approve_company(
        &self,
        actor: &Actor,
        company_id: &CompanyId,
    ) -> Result<Company, FarmError> {
        actor.require(Permission::ManageCompanies)?;
        let mut company = self.pending_company(company_id)?;

        company.status = CompanyStatus::Approved;
        company.reviewed_by = Some(actor.id().clone());
        company.reviewed_on = Some(self.today());
        self.repository.update_company(company.clone())?;

        for mut manager in self
            .repository
            .profiles(Some(company_id))?
            .into_iter()
            .filter(|profile| profile.role == UserRole::Manager && !profile.active)
        {
            manager.active = true;
            self.repository.update_profile(manager)?;
        }

        info!(company_id = %company.id, reviewer = %actor.id(), "company approved");
        Ok(company)
    }

    pub fn reject_company(
        &self,
        actor: &Actor,
        company_id: &CompanyId,
        reason: &str,
    ) -> Result<Company, FarmError> {
        actor.require(Permission::ManageCompanies)?;
        let reason = required_text(reason, "rejection reason")?;
        let mut company = self.pending_company(company_id)?;

        company.status = CompanyStatus::Rejected;
        company.reviewed_by = Some(actor.id().clone());
        company.reviewed_on = Some(self.today());
        company.rejection_reason = Some(reason);
        self.repository.update_company(company.clone())?;

        info!(company_id = %company.id, reviewer = %actor.id(), "company rejected");
        Ok(company)
    }

    pub fn list_companies(
        &self,
        actor: &Actor,
        status: Option<CompanyStatus>,
    ) -> Result<Vec<Company>, FarmError> {
        actor.require(Permission::ManageCompanies)?;
        let mut companies: Vec<Company> = self
            .repository
            .companies()?
            .into_iter()
            .filter(|company| status.map_or(true, |status| company.status == status))
            .collect();
        companies.sort_by_key(|company| company.name.to_lowercase());
        Ok(companies)
    }

    fn pending_company(&self, company_id: &CompanyId) -> Result<Company, FarmError> {
        let company = self
            .repository
            .fetch_company(company_id)?
            .ok_or_else(|| FarmError::not_found("company", company_id))?;
        if company.status != CompanyStatus::Pending {
            return Err(FarmError::Conflict(format!(
                "company {} has already been {}",
                company.id,
                company.status.label()
            )));
        }
        Ok(company)
    }

    pub(super) fn ensure_email_available(&self, email: &str) -> Result<(), FarmError> {
        let taken = self
            .repository
            .profiles(None)?
            .iter()
            .any(|profile| same_text(&profile.email, email));
        if taken {
            return Err(FarmError::Conflict(format!(
                "a user with e-mail {email} already exists"
            )));
        }
        Ok(())
    }
}
