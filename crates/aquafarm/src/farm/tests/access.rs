use super::common::*;
use crate::farm::access::AccessError;
use crate::farm::domain::{CompanyStatus, UserId, UserRole};
use crate::farm::repository::ProfileRepository;
use crate::farm::requests::NewUser;
use crate::farm::service::FarmError;

fn new_user(name: &str, email: &str, role: UserRole) -> NewUser {
    NewUser {
        full_name: name.to_string(),
        email: email.to_string(),
        role,
        company_id: None,
    }
}

#[test]
fn registered_manager_waits_for_company_approval() {
    let (service, _) = build_service();
    let receipt = service
        .register_company(registration("Blue Lagoon Aquaculture", "Mara@BlueLagoon.test"))
        .expect("registered");

    assert_eq!(receipt.company.status, CompanyStatus::Pending);
    assert_eq!(receipt.manager.role, UserRole::Manager);
    assert_eq!(receipt.manager.email, "mara@bluelagoon.test");
    assert!(!receipt.manager.active);

    match service.authenticate(&receipt.manager.id) {
        Err(FarmError::Access(AccessError::Inactive)) => {}
        other => panic!("expected inactive manager, got {other:?}"),
    }
}

#[test]
fn approval_activates_the_founding_manager() {
    let fixture = FarmFixture::new();
    let receipt = fixture
        .service
        .register_company(registration("Coral Reef Farms", "lee@coralreef.test"))
        .expect("registered");

    let company = fixture
        .service
        .approve_company(&fixture.admin, &receipt.company.id)
        .expect("approved");
    assert_eq!(company.status, CompanyStatus::Approved);
    assert_eq!(company.reviewed_by.as_ref(), Some(fixture.admin.id()));
    assert_eq!(company.reviewed_on, Some(today()));

    let manager = fixture
        .service
        .authenticate(&receipt.manager.id)
        .expect("manager signs in");
    assert_eq!(manager.company_id(), Some(&receipt.company.id));
}

#[test]
fn registration_rejects_duplicates_and_bad_addresses() {
    let fixture = FarmFixture::new();

    let same_name = fixture
        .service
        .register_company(registration("blue lagoon aquaculture", "new@bluelagoon.test"))
        .unwrap_err();
    assert!(matches!(same_name, FarmError::Conflict(_)), "got {same_name:?}");

    let same_email = fixture
        .service
        .register_company(registration("Another Farm", "MARA@bluelagoon.test"))
        .unwrap_err();
    assert!(matches!(same_email, FarmError::Conflict(_)), "got {same_email:?}");

    let bad_email = fixture
        .service
        .register_company(registration("Another Farm", "not-an-address"))
        .unwrap_err();
    assert!(matches!(bad_email, FarmError::Validation(_)), "got {bad_email:?}");
}

#[test]
fn duplicate_checks_fold_non_ascii_case() {
    let fixture = FarmFixture::new();
    fixture
        .service
        .register_company(registration("Ærø Fisk", "søren@aero.test"))
        .expect("first registration");

    let same_name = fixture
        .service
        .register_company(registration("ærø fisk", "other@aero.test"))
        .unwrap_err();
    assert!(matches!(same_name, FarmError::Conflict(_)), "got {same_name:?}");

    let same_email = fixture
        .service
        .register_company(registration("Aero Two", "SØREN@aero.test"))
        .unwrap_err();
    assert!(matches!(same_email, FarmError::Conflict(_)), "got {same_email:?}");
}

#[test]
fn only_administrators_review_companies() {
    let fixture = FarmFixture::new();
    let receipt = fixture
        .service
        .register_company(registration("Coral Reef Farms", "lee@coralreef.test"))
        .expect("registered");

    match fixture.service.approve_company(&fixture.manager, &receipt.company.id) {
        Err(FarmError::Access(AccessError::MissingPermission { role, .. })) => {
            assert_eq!(role, UserRole::Manager)
        }
        other => panic!("expected missing permission, got {other:?}"),
    }

    let rejected = fixture
        .service
        .reject_company(&fixture.admin, &receipt.company.id, "incomplete licence")
        .expect("rejected");
    assert_eq!(rejected.status, CompanyStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("incomplete licence"));

    let again = fixture
        .service
        .approve_company(&fixture.admin, &receipt.company.id)
        .unwrap_err();
    assert!(matches!(again, FarmError::Conflict(_)), "got {again:?}");

    match fixture.service.authenticate(&receipt.manager.id) {
        Err(FarmError::Access(AccessError::Inactive)) => {}
        other => panic!("expected inactive manager, got {other:?}"),
    }
}

#[test]
fn company_listing_filters_by_status() {
    let fixture = FarmFixture::new();
    fixture
        .service
        .register_company(registration("Coral Reef Farms", "lee@coralreef.test"))
        .expect("registered");

    let pending = fixture
        .service
        .list_companies(&fixture.admin, Some(CompanyStatus::Pending))
        .expect("listing");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name, "Coral Reef Farms");

    let all = fixture
        .service
        .list_companies(&fixture.admin, None)
        .expect("listing");
    let names: Vec<&str> = all.iter().map(|company| company.name.as_str()).collect();
    assert_eq!(names, vec!["Blue Lagoon Aquaculture", "Coral Reef Farms"]);
}

#[test]
fn unknown_callers_are_unauthenticated() {
    let fixture = FarmFixture::new();
    match fixture.service.authenticate(&UserId::from("usr-missing")) {
        Err(FarmError::Access(AccessError::Unauthenticated)) => {}
        other => panic!("expected unauthenticated, got {other:?}"),
    }
}

#[test]
fn managers_cannot_grant_administrator() {
    let fixture = FarmFixture::new();
    match fixture.service.create_user(
        &fixture.manager,
        new_user("Sneaky", "sneaky@bluelagoon.test", UserRole::Admin),
    ) {
        Err(FarmError::Access(AccessError::CannotGrant { granted, .. })) => {
            assert_eq!(granted, UserRole::Admin)
        }
        other => panic!("expected cannot grant, got {other:?}"),
    }
}

#[test]
fn managers_only_add_users_to_their_own_company() {
    let fixture = FarmFixture::new();
    let receipt = fixture
        .service
        .register_company(registration("Coral Reef Farms", "lee@coralreef.test"))
        .expect("registered");

    let mut request = new_user("Outsider", "out@bluelagoon.test", UserRole::Operator);
    request.company_id = Some(receipt.company.id.clone());
    match fixture.service.create_user(&fixture.manager, request) {
        Err(FarmError::Access(AccessError::OutsideCompany)) => {}
        other => panic!("expected outside company, got {other:?}"),
    }

    let missing_company = fixture
        .service
        .create_user(
            &fixture.admin,
            new_user("Floating", "float@bluelagoon.test", UserRole::Operator),
        )
        .unwrap_err();
    assert!(matches!(missing_company, FarmError::Validation(_)));

    let mut placed = new_user("Placed", "placed@coralreef.test", UserRole::Viewer);
    placed.company_id = Some(receipt.company.id.clone());
    let profile = fixture
        .service
        .create_user(&fixture.admin, placed)
        .expect("admin places user");
    assert_eq!(profile.company_id, Some(receipt.company.id));
}

#[test]
fn operators_cannot_manage_users() {
    let fixture = FarmFixture::new();
    match fixture.service.list_users(&fixture.operator, None) {
        Err(FarmError::Access(AccessError::MissingPermission { .. })) => {}
        other => panic!("expected missing permission, got {other:?}"),
    }
}

#[test]
fn user_listing_is_scoped_and_sorted() {
    let fixture = FarmFixture::new();
    let users = fixture
        .service
        .list_users(&fixture.manager, None)
        .expect("listing");
    let names: Vec<&str> = users.iter().map(|user| user.full_name.as_str()).collect();
    assert_eq!(names, vec!["Ike Tan", "Mara Santos", "Vera Lim"]);

    let everyone = fixture
        .service
        .list_users(&fixture.admin, None)
        .expect("admin listing");
    assert_eq!(everyone.len(), 4);

    let company_only = fixture
        .service
        .list_users(&fixture.admin, Some(&fixture.company_id))
        .expect("filtered listing");
    assert_eq!(company_only.len(), 3);
}

#[test]
fn role_changes_keep_a_manager_in_charge() {
    let fixture = FarmFixture::new();

    let own = fixture
        .service
        .update_role(&fixture.manager, fixture.manager.id(), UserRole::Viewer)
        .unwrap_err();
    assert!(matches!(own, FarmError::Validation(_)), "got {own:?}");

    let last = fixture
        .service
        .update_role(&fixture.admin, fixture.manager.id(), UserRole::Operator)
        .unwrap_err();
    assert!(matches!(last, FarmError::Conflict(_)), "got {last:?}");

    let promoted = fixture
        .service
        .update_role(&fixture.manager, fixture.operator.id(), UserRole::Manager)
        .expect("operator promoted");
    assert_eq!(promoted.role, UserRole::Manager);

    fixture
        .service
        .update_role(&fixture.admin, fixture.manager.id(), UserRole::Operator)
        .expect("second manager now exists");

    let to_admin = fixture
        .service
        .update_role(&fixture.admin, fixture.viewer.id(), UserRole::Admin)
        .unwrap_err();
    assert!(matches!(to_admin, FarmError::Validation(_)));
}

#[test]
fn deactivated_users_lose_access() {
    let fixture = FarmFixture::new();
    let profile = fixture
        .service
        .set_active(&fixture.manager, fixture.viewer.id(), false)
        .expect("viewer disabled");
    assert!(!profile.active);

    let stored = fixture
        .store
        .fetch_profile(fixture.viewer.id())
        .expect("store reachable")
        .expect("profile kept");
    assert!(!stored.active);

    match fixture.service.authenticate(fixture.viewer.id()) {
        Err(FarmError::Access(AccessError::Inactive)) => {}
        other => panic!("expected inactive, got {other:?}"),
    }

    fixture
        .service
        .set_active(&fixture.manager, fixture.viewer.id(), true)
        .expect("viewer restored");
    fixture
        .service
        .authenticate(fixture.viewer.id())
        .expect("viewer signs in again");
}

#[test]
fn bootstrap_admin_is_idempotent() {
    let fixture = FarmFixture::new();
    let again = fixture
        .service
        .bootstrap_admin(&crate::config::AdminSeed {
            full_name: "Someone Else".to_string(),
            email: "ADMIN@aquafarm.test".to_string(),
        })
        .expect("existing admin returned");
    assert_eq!(&again.id, fixture.admin.id());
}
