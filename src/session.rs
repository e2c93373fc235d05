// Session state machine for the portal client.
//
// Allowed transitions:
//
//   stage            | operation          | on success          | on failure
//   -----------------+--------------------+---------------------+-----------
//   Unauthenticated  | sign_in            | Authenticated       | unchanged
//   >= Authenticated | sign_in            | AlreadyAuthenticated error, nothing sent
//   Authenticated    | load_context       | ContextLoaded       | unchanged
//   ContextLoaded    | load_context       | ContextLoaded (noop)| -
//   ContextLoaded    | fetch_term_list    | unchanged           | unchanged
//   ContextLoaded    | fetch_groups       | marking period set  | unchanged
//   >= Authenticated | fetch_assignments  | unchanged           | unchanged
//
// Stages only move forward; starting over means building a new client.
// Operations that change state take `&mut self`, read-only fetches take
// `&self`, so one client can't interleave them.

use crate::config::{ApiPaths, ClientConfig};
use crate::decode::{decode_list, decode_map, ContextMap};
use crate::error::{Result, WhapiError};
use crate::model::{
    AcademicGroup, Assignment, Credentials, Id, OrgContext, SessionIdentity, SignInRequest,
    SignInResponse, Term, TermScope,
};
use crate::query::add_queries;
use crate::term::select_current;
use crate::transport::{HttpTransport, Transport};
use reqwest::Method;
use tracing::{debug, info, warn};

/// Portal constant for student group membership.
const MEMBER_LEVEL: &str = "3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionStage {
    Unauthenticated,
    Authenticated,
    ContextLoaded,
}

pub struct Session<T: Transport = HttpTransport> {
    transport: T,
    paths: ApiPaths,
    stage: SessionStage,
    credentials: Option<Credentials>,
    identity: Option<SessionIdentity>,
    org: Option<OrgContext>,
    scope: TermScope,
}

impl Session<HttpTransport> {
    /// Build a client that talks to the portal over HTTP.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Session::new(transport, ApiPaths::new(&config.base_url)))
    }
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, paths: ApiPaths) -> Self {
        Session {
            transport,
            paths,
            stage: SessionStage::Unauthenticated,
            credentials: None,
            identity: None,
            org: None,
            scope: TermScope::default(),
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn paths(&self) -> &ApiPaths {
        &self.paths
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn org_context(&self) -> Option<&OrgContext> {
        self.org.as_ref()
    }

    pub fn term_scope(&self) -> &TermScope {
        &self.scope
    }

    pub fn is_authenticated(&self) -> bool {
        self.stage >= SessionStage::Authenticated
    }

    pub fn is_context_loaded(&self) -> bool {
        self.stage >= SessionStage::ContextLoaded
    }

    fn check_signed_in(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(WhapiError::NotAuthenticated)
        }
    }

    /// Signed in and context loaded; the first unmet precondition is reported.
    /// Returns the identity and org context so callers don't re-check them.
    fn check_ready(&self) -> Result<(&SessionIdentity, &OrgContext)> {
        self.check_signed_in()?;
        match (&self.identity, &self.org) {
            (Some(identity), Some(org)) if self.is_context_loaded() => Ok((identity, org)),
            _ => Err(WhapiError::ContextNotLoaded),
        }
    }

    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.transport.send(Method::GET, url, None, None)
    }

    /// Sign in with the given credentials. On success the transport holds the
    /// session cookie every later call depends on.
    ///
    /// Credentials are write-once: a signed-in client refuses a second sign-in
    /// so a new cookie can never be paired with the old identity.
    pub fn sign_in(&mut self, username: &str, password: &str) -> Result<()> {
        if let Some(current) = &self.credentials {
            return Err(WhapiError::AlreadyAuthenticated {
                username: current.username.clone(),
            });
        }
        let body = serde_json::to_vec(&SignInRequest { username, password })?;
        debug!(username, "signing in");
        let res = match self
            .transport
            .send(Method::POST, &self.paths.sign_in, Some(body), None)
        {
            Ok(res) => res,
            // The portal may reject credentials with a client error status.
            Err(WhapiError::Status { status, .. }) if (400..500).contains(&status) => {
                warn!(username, status, "sign-in rejected");
                return Err(WhapiError::AuthenticationFailed(format!(
                    "sign-in rejected with status {}",
                    status
                )));
            }
            Err(e) => return Err(e),
        };

        let parsed: SignInResponse = serde_json::from_slice(&res).map_err(|e| {
            WhapiError::AuthenticationFailed(format!("malformed sign-in response: {}", e))
        })?;
        if !parsed.login_successful {
            warn!(username, "sign-in rejected");
            return Err(WhapiError::AuthenticationFailed(
                "Invalid login credentials".into(),
            ));
        }

        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self.stage = SessionStage::Authenticated;
        info!(username, "signed in");
        Ok(())
    }

    /// Raw user context payload.
    pub fn fetch_user_context(&self) -> Result<ContextMap> {
        self.check_signed_in()?;
        decode_map(&self.get(&self.paths.context)?)
    }

    /// Raw school context payload.
    pub fn fetch_school_context(&self) -> Result<ContextMap> {
        self.check_signed_in()?;
        decode_map(&self.get(&self.paths.school_context)?)
    }

    /// Fetch user and school context and record identity, persona and school
    /// year. Nothing is stored unless every field was found.
    pub fn load_context(&mut self) -> Result<()> {
        self.check_signed_in()?;
        if self.is_context_loaded() {
            debug!("context already loaded");
            return Ok(());
        }

        let user_ctx = self.fetch_user_context()?;
        let school_ctx = self.fetch_school_context()?;

        let identity = SessionIdentity {
            user_id: extracted(user_ctx.required_id("UserInfo.UserId"))?,
            persona_id: extracted(user_ctx.required_id("Personas[0].Id"))?,
        };
        let org = OrgContext {
            school_name: extracted(school_ctx.required_str("SchoolInfo.SchoolName"))?,
            school_year_label: extracted(
                school_ctx.required_str("CurrentSchoolYear.SchoolYearLabel"),
            )?,
        };

        info!(%identity, %org, "context loaded");
        self.identity = Some(identity);
        self.org = Some(org);
        self.stage = SessionStage::ContextLoaded;
        Ok(())
    }

    /// Terms for the current school year, as the portal returns them.
    pub fn fetch_term_list(&self) -> Result<Vec<Term>> {
        let (identity, org) = self.check_ready()?;
        let url = add_queries(
            &self.paths.term_list,
            &[
                ("studentUserId", identity.user_id.as_str()),
                ("personaId", identity.persona_id.as_str()),
                ("schoolYearLabel", org.school_year_label.as_str()),
            ],
        )?;
        let terms: Vec<Term> = decode_list(&self.get(&url)?)?;
        debug!(count = terms.len(), "term list fetched");
        Ok(terms)
    }

    /// Fetch the term list and pick the current term out of it.
    pub fn current_term(&self) -> Result<Term> {
        let terms = self.fetch_term_list()?;
        select_current(&terms).cloned()
    }

    /// Classes for the given term. A non-empty answer also fixes the current
    /// marking period, read off the first class.
    pub fn fetch_groups(&mut self, duration_id: &Id) -> Result<Vec<AcademicGroup>> {
        let (identity, org) = self.check_ready()?;
        let url = add_queries(
            &self.paths.academic_groups,
            &[
                ("userId", identity.user_id.as_str()),
                ("schoolYearLabel", org.school_year_label.as_str()),
                ("memberLevel", MEMBER_LEVEL),
                ("persona", identity.persona_id.as_str()),
                ("durationList", duration_id.as_str()),
                // Required by the portal even though it is always empty.
                ("markingPeriodId", ""),
            ],
        )?;
        let groups: Vec<AcademicGroup> = decode_list(&self.get(&url)?)?;

        self.scope.current_duration_id = Some(duration_id.clone());
        match groups.first() {
            Some(first) => {
                let marking_period = first.marking_period_id.clone();
                if groups.iter().any(|g| g.marking_period_id != marking_period) {
                    warn!(
                        %marking_period,
                        "groups span several marking periods, using the first group's"
                    );
                }
                debug!(count = groups.len(), %marking_period, "groups fetched");
                self.scope.current_marking_period_id = Some(marking_period);
            }
            None => debug!(%duration_id, "no groups for term"),
        }
        Ok(groups)
    }

    /// Gradebook assignments of one class in the current marking period.
    pub fn fetch_assignments(&self, section_id: &Id) -> Result<Vec<Assignment>> {
        self.check_signed_in()?;
        let marking_period = self
            .scope
            .current_marking_period_id
            .as_ref()
            .ok_or(WhapiError::MarkingPeriodUnset)?;
        let identity = self.identity.as_ref().ok_or(WhapiError::ContextNotLoaded)?;

        let url = add_queries(
            &self.paths.gradebook_assignments,
            &[
                ("sectionId", section_id.as_str()),
                ("markingPeriodId", marking_period.as_str()),
                ("studentUserId", identity.user_id.as_str()),
            ],
        )?;
        let assignments: Vec<Assignment> = decode_list(&self.get(&url)?)?;
        debug!(%section_id, count = assignments.len(), "assignments fetched");
        Ok(assignments)
    }
}

/// Context fields that resolve to the wrong JSON type are reported the same
/// way as missing ones, naming the field.
fn extracted<V>(result: Result<V>) -> Result<V> {
    result.map_err(|e| match e {
        WhapiError::Decode {
            path: Some(field), ..
        } => WhapiError::ContextExtractionFailed { field },
        other => other,
    })
}
