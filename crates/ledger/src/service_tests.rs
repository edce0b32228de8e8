//! End-to-end service behavior over the in-memory store: resolution
//! properties, the invite gate sequence, provisioning, and fail-closed
//! handling of store outages.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crewgate_access::{PlatformSentinel, Resolution, Role};
use crewgate_core::{
    AccessError, EmailAddress, InternalUserId, InviteId, MembershipConflict, PrincipalId,
    WorkspaceId,
};
use crewgate_store::{
    AcceptGrant, AccessStore, CreateInviteParams, CreateUserParams, CreateWorkspaceParams,
    InMemoryStore, InviteRecord, MemberRecord, StoreError, UserGrants, UserRecord, WorkspaceRecord,
};

use crate::{AccessService, InviteScope, InviteState, ProvisionedAs, ServiceConfig};

fn sentinel_ws() -> WorkspaceId {
    WorkspaceId::from_uuid(Uuid::from_u128(0xC0FFEE))
}

fn setup() -> (Arc<InMemoryStore>, AccessService) {
    let store = Arc::new(InMemoryStore::default());
    let config = ServiceConfig::new(PlatformSentinel::new(sentinel_ws()));
    (store.clone(), AccessService::new(store, config))
}

fn principal(tag: &str) -> PrincipalId {
    PrincipalId::new(format!("idp|{tag}")).unwrap()
}

fn email(tag: &str) -> EmailAddress {
    EmailAddress::parse(&format!("{tag}@example.com")).unwrap()
}

async fn operator(service: &AccessService, tag: &str) -> PrincipalId {
    let p = principal(tag);
    service
        .provision_principal(&p, &email(tag), ProvisionedAs::PlatformOperator)
        .await
        .unwrap();
    p
}

async fn owner_with_workspace(service: &AccessService, tag: &str) -> (PrincipalId, WorkspaceId) {
    let p = principal(tag);
    service
        .provision_principal(&p, &email(tag), ProvisionedAs::Member)
        .await
        .unwrap();
    let (workspace, record) = service.provision_workspace(&p, tag).await.unwrap();
    assert_eq!(record.role(), Role::WorkspaceAdmin);
    (p, workspace.id)
}

async fn staff_member(
    service: &AccessService,
    inviter: &PrincipalId,
    ws: WorkspaceId,
    tag: &str,
) -> PrincipalId {
    let created = service
        .create_invite(inviter, &email(tag), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();
    let p = principal(tag);
    service
        .accept_invite(&created.token, &email(tag), &p)
        .await
        .unwrap();
    p
}

// ───────────────────────────── Resolution ─────────────────────────────

#[tokio::test]
async fn unknown_principal_resolves_unauthenticated() {
    let (_store, service) = setup();
    let resolution = service.resolve(&principal("ghost")).await.unwrap();
    assert_eq!(resolution, Resolution::Unauthenticated);
}

#[tokio::test]
async fn a_member_without_grants_is_unauthenticated() {
    let (_store, service) = setup();
    let p = principal("newbie");
    service
        .provision_principal(&p, &email("newbie"), ProvisionedAs::Member)
        .await
        .unwrap();

    assert_eq!(service.resolve(&p).await.unwrap(), Resolution::Unauthenticated);
}

#[tokio::test]
async fn resolution_is_deterministic_across_reads() {
    let (_store, service) = setup();
    let (p, ws) = owner_with_workspace(&service, "det-owner").await;

    let first = service.require_record(&p).await.unwrap();
    let second = service.require_record(&p).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.workspace_id(), Some(ws));
}

#[tokio::test]
async fn direct_stamp_wins_over_a_later_staff_grant() {
    let (store, service) = setup();
    let op = operator(&service, "stamped").await;
    let (owner, ws) = owner_with_workspace(&service, "stamp-owner").await;

    // The stamp is not a grant, so nothing blocks the stamped user from
    // accepting a staff invite; resolution still reports the stamp.
    let created = service
        .create_invite(&owner, &email("stamped"), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();
    let record = service
        .accept_invite(&created.token, &email("stamped"), &op)
        .await
        .unwrap();
    assert_eq!(record.role(), Role::PlatformOperator);
    assert_eq!(record.workspace_id(), None);

    let user = store.user_by_principal(&op).await.unwrap();
    let grants = store.grants_for_user(user.id).await.unwrap();
    assert_eq!(grants.staff.len(), 1);
}

// ───────────────────────────── Invite lifecycle ─────────────────────────────

#[tokio::test]
async fn workspace_staff_invite_end_to_end() {
    let (_store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "acme").await;

    let created = service
        .create_invite(&owner, &email("newhire"), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();
    assert_eq!(created.workspace_id, Some(ws));

    let staff = principal("newhire");
    let record = service
        .accept_invite(&created.token, &email("newhire"), &staff)
        .await
        .unwrap();
    assert_eq!(record.role(), Role::Staff);
    assert_eq!(record.workspace_id(), Some(ws));

    // Later resolution matches what accept returned.
    assert_eq!(service.require_record(&staff).await.unwrap(), record);

    // The token is single-use.
    let err = service
        .accept_invite(&created.token, &email("newhire"), &staff)
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::InviteAlreadyUsed);

    let listed = service
        .list_invites(&owner, InviteScope::Workspace(ws))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].state, InviteState::Accepted);
}

#[tokio::test]
async fn legacy_sentinel_invite_grants_platform_scope() {
    let (store, service) = setup();
    let op = operator(&service, "root-op").await;
    let op_user = store.user_by_principal(&op).await.unwrap();

    // A row imported from the predecessor system: platform scope encoded
    // as the reserved workspace id instead of NULL.
    store
        .insert_invite(&CreateInviteParams {
            token: "legacy-platform-invite".into(),
            email: email("second-op"),
            role: Role::Staff,
            workspace_id: Some(sentinel_ws()),
            invited_by: op_user.id,
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap();

    let p = principal("second-op");
    let record = service
        .accept_invite("legacy-platform-invite", &email("second-op"), &p)
        .await
        .unwrap();
    assert_eq!(record.role(), Role::PlatformOperator);
    assert_eq!(record.workspace_id(), None);

    // The grant materialized platform-scoped, not sentinel-scoped.
    let user = store.user_by_principal(&p).await.unwrap();
    let grants = store.grants_for_user(user.id).await.unwrap();
    assert_eq!(grants.admin.len(), 1);
    assert_eq!(grants.admin[0].workspace_id, None);
}

#[tokio::test]
async fn operators_create_platform_invites_that_mint_operators() {
    let (_store, service) = setup();
    let op = operator(&service, "first-op").await;

    let created = service
        .create_invite(&op, &email("peer"), Role::Staff, InviteScope::Platform)
        .await
        .unwrap();
    assert_eq!(created.workspace_id, None);

    let record = service
        .accept_invite(&created.token, &email("peer"), &principal("peer"))
        .await
        .unwrap();
    assert_eq!(record.role(), Role::PlatformOperator);
    assert_eq!(record.workspace_id(), None);
}

#[tokio::test]
async fn an_admin_cannot_accept_staff_invites_anywhere() {
    let (store, service) = setup();
    let (owner_a, _ws_a) = owner_with_workspace(&service, "alpha").await;
    let (owner_b, ws_b) = owner_with_workspace(&service, "beta").await;

    let created = service
        .create_invite(&owner_b, &email("alpha"), Role::Staff, InviteScope::Workspace(ws_b))
        .await
        .unwrap();

    let err = service
        .accept_invite(&created.token, &email("alpha"), &owner_a)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AccessError::AlreadyMember(MembershipConflict::ExistingAdmin)
    );

    // The refused accept left no staff row and the invite pending.
    let user = store.user_by_principal(&owner_a).await.unwrap();
    assert!(store.grants_for_user(user.id).await.unwrap().staff.is_empty());
    let listed = service
        .list_invites(&owner_b, InviteScope::Workspace(ws_b))
        .await
        .unwrap();
    assert_eq!(listed[0].state, InviteState::Pending);
}

#[tokio::test]
async fn a_second_staff_invite_fails_leaving_the_first_grant_untouched() {
    let (store, service) = setup();
    let (owner_a, ws_a) = owner_with_workspace(&service, "gamma").await;
    let (owner_b, ws_b) = owner_with_workspace(&service, "delta").await;

    let staff = staff_member(&service, &owner_a, ws_a, "worker").await;

    let second = service
        .create_invite(&owner_b, &email("worker"), Role::Staff, InviteScope::Workspace(ws_b))
        .await
        .unwrap();
    let err = service
        .accept_invite(&second.token, &email("worker"), &staff)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AccessError::AlreadyMember(MembershipConflict::ExistingStaff)
    );

    let user = store.user_by_principal(&staff).await.unwrap();
    let grants = store.grants_for_user(user.id).await.unwrap();
    assert_eq!(grants.staff.len(), 1);
    assert_eq!(grants.staff[0].workspace_id, ws_a);

    let listed = service
        .list_invites(&owner_b, InviteScope::Workspace(ws_b))
        .await
        .unwrap();
    assert_eq!(listed[0].state, InviteState::Pending);
}

#[tokio::test]
async fn revoke_is_idempotent_and_kills_the_token() {
    let (_store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "rev").await;

    let created = service
        .create_invite(&owner, &email("target"), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();

    service.revoke_invite(&created.token, &owner).await.unwrap();
    service.revoke_invite(&created.token, &owner).await.unwrap();

    let err = service
        .accept_invite(&created.token, &email("target"), &principal("target"))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::InviteInvalid);
}

#[tokio::test]
async fn revoking_an_accepted_invite_is_a_noop_success() {
    let (_store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "rev2").await;

    let created = service
        .create_invite(&owner, &email("hired"), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();
    service
        .accept_invite(&created.token, &email("hired"), &principal("hired"))
        .await
        .unwrap();

    service.revoke_invite(&created.token, &owner).await.unwrap();

    let listed = service
        .list_invites(&owner, InviteScope::Workspace(ws))
        .await
        .unwrap();
    assert_eq!(listed[0].state, InviteState::Accepted);
}

#[tokio::test]
async fn a_stale_invite_reports_expired_not_invalid() {
    let (store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "stale").await;
    let owner_user = store.user_by_principal(&owner).await.unwrap();

    store
        .insert_invite(&CreateInviteParams {
            token: "stale-token".into(),
            email: email("late"),
            role: Role::Staff,
            workspace_id: Some(ws),
            invited_by: owner_user.id,
            expires_at: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();

    let err = service
        .accept_invite("stale-token", &email("late"), &principal("late"))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::InviteExpired);

    let listed = service
        .list_invites(&owner, InviteScope::Workspace(ws))
        .await
        .unwrap();
    assert_eq!(listed[0].state, InviteState::Expired);

    // A token that never existed is invalid, not expired.
    let err = service
        .accept_invite("no-such-token", &email("late"), &principal("late"))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::InviteInvalid);
}

#[tokio::test]
async fn email_gate_is_case_insensitive_but_exact() {
    let (_store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "mail").await;

    let created = service
        .create_invite(&owner, &email("casey"), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();

    let err = service
        .accept_invite(&created.token, &email("impostor"), &principal("impostor"))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::EmailMismatch);

    // Same address, different case, passes.
    let cased = EmailAddress::parse("CASEY@Example.COM").unwrap();
    let record = service
        .accept_invite(&created.token, &cased, &principal("casey"))
        .await
        .unwrap();
    assert_eq!(record.role(), Role::Staff);
}

#[tokio::test]
async fn concurrent_accepts_have_exactly_one_winner() {
    let (store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "race").await;

    let created = service
        .create_invite(&owner, &email("racer"), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();

    let racer = principal("racer");
    let racer_email = email("racer");
    let (a, b) = tokio::join!(
        service.accept_invite(&created.token, &racer_email, &racer),
        service.accept_invite(&created.token, &racer_email, &racer),
    );

    let loser = match (a, b) {
        (Ok(_), Err(loser)) => loser,
        (Err(loser), Ok(_)) => loser,
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(loser, AccessError::InviteAlreadyUsed);

    let user = store.user_by_principal(&racer).await.unwrap();
    let grants = store.grants_for_user(user.id).await.unwrap();
    assert_eq!(grants.staff.len(), 1);

    let listed = service
        .list_invites(&owner, InviteScope::Workspace(ws))
        .await
        .unwrap();
    assert_eq!(listed[0].state, InviteState::Accepted);
}

// ───────────────────────────── Invite authorization ─────────────────────────────

#[tokio::test]
async fn workspace_admins_cannot_create_platform_invites() {
    let (_store, service) = setup();
    let (owner, _ws) = owner_with_workspace(&service, "modest").await;

    let err = service
        .create_invite(&owner, &email("mole"), Role::Staff, InviteScope::Platform)
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::Unauthorized);
}

#[tokio::test]
async fn admins_are_confined_to_their_own_workspace_for_invites() {
    let (_store, service) = setup();
    let (owner_a, _ws_a) = owner_with_workspace(&service, "mine").await;
    let (_owner_b, ws_b) = owner_with_workspace(&service, "theirs").await;

    let err = service
        .create_invite(&owner_a, &email("poach"), Role::Staff, InviteScope::Workspace(ws_b))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::Unauthorized);
}

#[tokio::test]
async fn operators_may_invite_into_any_workspace() {
    let (_store, service) = setup();
    let op = operator(&service, "any-op").await;
    let (_owner, ws) = owner_with_workspace(&service, "anyws").await;

    let created = service
        .create_invite(&op, &email("placed"), Role::Staff, InviteScope::Workspace(ws))
        .await
        .unwrap();
    assert_eq!(created.workspace_id, Some(ws));
}

#[tokio::test]
async fn naming_the_sentinel_workspace_means_platform_scope() {
    let (_store, service) = setup();
    let (owner, _ws) = owner_with_workspace(&service, "sneaky").await;

    // Addressing the reserved workspace is a platform invite, which a
    // workspace admin may not create.
    let err = service
        .create_invite(
            &owner,
            &email("sneak"),
            Role::Staff,
            InviteScope::Workspace(sentinel_ws()),
        )
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::Unauthorized);
}

#[tokio::test]
async fn only_the_staff_role_is_invitable() {
    let (_store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "roles").await;

    for role in [Role::WorkspaceAdmin, Role::PlatformOperator] {
        let err = service
            .create_invite(&owner, &email("vip"), role, InviteScope::Workspace(ws))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Validation(_)), "{role} was invitable");
    }
}

#[tokio::test]
async fn invites_into_unknown_workspaces_are_refused() {
    let (_store, service) = setup();
    let op = operator(&service, "careful-op").await;

    let err = service
        .create_invite(
            &op,
            &email("lost"),
            Role::Staff,
            InviteScope::Workspace(WorkspaceId::new()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Validation(_)));
}

#[tokio::test]
async fn invite_listing_is_scope_isolated() {
    let (_store, service) = setup();
    let op = operator(&service, "lister-op").await;
    let (owner_a, ws_a) = owner_with_workspace(&service, "lista").await;
    let (owner_b, ws_b) = owner_with_workspace(&service, "listb").await;

    service
        .create_invite(&owner_a, &email("a1"), Role::Staff, InviteScope::Workspace(ws_a))
        .await
        .unwrap();
    service
        .create_invite(&owner_b, &email("b1"), Role::Staff, InviteScope::Workspace(ws_b))
        .await
        .unwrap();
    service
        .create_invite(&op, &email("p1"), Role::Staff, InviteScope::Platform)
        .await
        .unwrap();

    let a = service
        .list_invites(&owner_a, InviteScope::Workspace(ws_a))
        .await
        .unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].email, email("a1"));

    // An admin cannot list another workspace; an operator can.
    let err = service
        .list_invites(&owner_a, InviteScope::Workspace(ws_b))
        .await
        .unwrap_err();
    assert_eq!(err, AccessError::Unauthorized);
    let b = service
        .list_invites(&op, InviteScope::Workspace(ws_b))
        .await
        .unwrap();
    assert_eq!(b.len(), 1);

    let platform = service.list_invites(&op, InviteScope::Platform).await.unwrap();
    assert_eq!(platform.len(), 1);
    assert_eq!(platform[0].workspace_id, None);
}

#[tokio::test]
async fn platform_listing_includes_legacy_sentinel_rows() {
    let (store, service) = setup();
    let op = operator(&service, "legacy-lister").await;
    let op_user = store.user_by_principal(&op).await.unwrap();

    service
        .create_invite(&op, &email("modern"), Role::Staff, InviteScope::Platform)
        .await
        .unwrap();
    store
        .insert_invite(&CreateInviteParams {
            token: "imported".into(),
            email: email("imported"),
            role: Role::Staff,
            workspace_id: Some(sentinel_ws()),
            invited_by: op_user.id,
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap();

    let listed = service.list_invites(&op, InviteScope::Platform).await.unwrap();
    assert_eq!(listed.len(), 2);
    // Both normalize to platform scope in the summary.
    assert!(listed.iter().all(|invite| invite.workspace_id.is_none()));
}

// ───────────────────────────── Provisioning ─────────────────────────────

#[tokio::test]
async fn provisioning_is_idempotent() {
    let (_store, service) = setup();
    let p = principal("again");

    let first = service
        .provision_principal(&p, &email("again"), ProvisionedAs::Member)
        .await
        .unwrap();
    let second = service
        .provision_principal(&p, &email("again"), ProvisionedAs::Member)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn provisioning_links_principals_to_imported_users() {
    let (store, service) = setup();
    // Imported row: email known, no sign-in linked yet.
    let imported = store
        .create_user(&CreateUserParams {
            principal_id: None,
            email: email("import"),
            direct_operator: false,
        })
        .await
        .unwrap();

    let p = principal("import");
    let user = service
        .provision_principal(&p, &email("import"), ProvisionedAs::Member)
        .await
        .unwrap();
    assert_eq!(user.id, imported.id);
    assert_eq!(user.principal_id, Some(p.clone()));

    assert_eq!(store.user_by_principal(&p).await.unwrap().id, imported.id);
}

#[tokio::test]
async fn a_second_principal_cannot_take_over_an_email() {
    let (_store, service) = setup();
    let p = principal("mail-owner");
    service
        .provision_principal(&p, &email("shared"), ProvisionedAs::Member)
        .await
        .unwrap();

    let intruder = principal("intruder");
    let err = service
        .provision_principal(&intruder, &email("shared"), ProvisionedAs::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Validation(_)));
}

#[tokio::test]
async fn workspace_signup_returns_the_admin_record() {
    let (_store, service) = setup();
    let p = principal("founder");
    service
        .provision_principal(&p, &email("founder"), ProvisionedAs::Member)
        .await
        .unwrap();

    let (workspace, record) = service.provision_workspace(&p, "Founders Inc").await.unwrap();
    assert_eq!(record.role(), Role::WorkspaceAdmin);
    assert_eq!(record.workspace_id(), Some(workspace.id));
    assert_eq!(workspace.name, "Founders Inc");
}

#[tokio::test]
async fn members_cannot_sign_up_for_a_second_workspace() {
    let (_store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "solo").await;

    let err = service.provision_workspace(&owner, "Second").await.unwrap_err();
    assert_eq!(
        err,
        AccessError::AlreadyMember(MembershipConflict::ExistingAdmin)
    );

    let staff = staff_member(&service, &owner, ws, "tied").await;
    let err = service.provision_workspace(&staff, "Moonlight").await.unwrap_err();
    assert_eq!(
        err,
        AccessError::AlreadyMember(MembershipConflict::ExistingStaff)
    );
}

#[tokio::test]
async fn member_listing_is_scoped_by_the_record() {
    let (_store, service) = setup();
    let (owner, ws) = owner_with_workspace(&service, "roster").await;
    let staff = staff_member(&service, &owner, ws, "col").await;

    let owner_record = service.require_record(&owner).await.unwrap();
    let members = service.workspace_members(&owner_record).await.unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().any(|m| m.role == Role::WorkspaceAdmin));
    assert!(members.iter().any(|m| m.role == Role::Staff));

    // Staff see their own roster too; the record scopes, not the role.
    let staff_record = service.require_record(&staff).await.unwrap();
    assert_eq!(
        service.workspace_members(&staff_record).await.unwrap().len(),
        2
    );

    // Operators have no workspace of their own to list here.
    let op = operator(&service, "roster-op").await;
    let op_record = service.require_record(&op).await.unwrap();
    let err = service.workspace_members(&op_record).await.unwrap_err();
    assert!(matches!(err, AccessError::Validation(_)));
}

// ───────────────────────────── Fail closed ─────────────────────────────

struct OutageStore {
    delay: Option<StdDuration>,
}

impl OutageStore {
    async fn out<T>(&self) -> Result<T, StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(StoreError::backend("injected outage"))
    }
}

#[async_trait::async_trait]
impl AccessStore for OutageStore {
    async fn create_user(&self, _params: &CreateUserParams) -> Result<UserRecord, StoreError> {
        self.out().await
    }

    async fn user_by_principal(&self, _principal: &PrincipalId) -> Result<UserRecord, StoreError> {
        self.out().await
    }

    async fn user_by_email(&self, _email: &EmailAddress) -> Result<UserRecord, StoreError> {
        self.out().await
    }

    async fn link_principal(
        &self,
        _user_id: InternalUserId,
        _principal: &PrincipalId,
    ) -> Result<(), StoreError> {
        self.out().await
    }

    async fn create_workspace(
        &self,
        _params: &CreateWorkspaceParams,
    ) -> Result<WorkspaceRecord, StoreError> {
        self.out().await
    }

    async fn workspace_by_id(
        &self,
        _workspace_id: WorkspaceId,
    ) -> Result<WorkspaceRecord, StoreError> {
        self.out().await
    }

    async fn grants_for_user(&self, _user_id: InternalUserId) -> Result<UserGrants, StoreError> {
        self.out().await
    }

    async fn workspace_members(
        &self,
        _workspace_id: WorkspaceId,
    ) -> Result<Vec<MemberRecord>, StoreError> {
        self.out().await
    }

    async fn insert_invite(
        &self,
        _params: &CreateInviteParams,
    ) -> Result<InviteRecord, StoreError> {
        self.out().await
    }

    async fn invite_by_token(&self, _token: &str) -> Result<InviteRecord, StoreError> {
        self.out().await
    }

    async fn list_invites(
        &self,
        _workspace_id: Option<WorkspaceId>,
    ) -> Result<Vec<InviteRecord>, StoreError> {
        self.out().await
    }

    async fn mark_revoked(&self, _invite_id: InviteId) -> Result<(), StoreError> {
        self.out().await
    }

    async fn accept_invite(
        &self,
        _invite_id: InviteId,
        _user_id: InternalUserId,
        _grant: AcceptGrant,
        _accepted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.out().await
    }
}

#[tokio::test]
async fn store_failure_is_unavailable_not_unauthenticated() {
    let store = Arc::new(OutageStore { delay: None });
    let service = AccessService::new(store, ServiceConfig::new(PlatformSentinel::new(sentinel_ws())));

    let err = service.resolve(&principal("anyone")).await.unwrap_err();
    assert!(matches!(err, AccessError::StoreUnavailable(_)));

    let err = service
        .accept_invite("whatever", &email("anyone"), &principal("anyone"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::StoreUnavailable(_)));
}

#[tokio::test(start_paused = true)]
async fn slow_stores_hit_the_deadline_and_fail_closed() {
    let store = Arc::new(OutageStore {
        delay: Some(StdDuration::from_secs(60)),
    });
    let mut config = ServiceConfig::new(PlatformSentinel::new(sentinel_ws()));
    config.store_timeout = StdDuration::from_millis(250);
    let service = AccessService::new(store, config);

    let err = service.resolve(&principal("patient")).await.unwrap_err();
    assert!(matches!(err, AccessError::StoreUnavailable(_)));
}
