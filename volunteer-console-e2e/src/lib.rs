//! An in-process stand-in for the volunteer-management REST backend, served over real TCP so the
//! console can be driven end to end through [`volunteer_console_api::ApiClient`].

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt as _, Full};
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, error, info};
use volunteer_console_api::id::{AppointmentId, GroupId, StudyId, VolunteerId};
use volunteer_console_api::model::{
    Appointment, AssociationKey, BankDetails, Cancellation, Group, Study, Volunteer,
};

/// Everything the mock backend knows.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub studies: Vec<Study>,
    pub groups: Vec<Group>,
    pub volunteers: Vec<Volunteer>,
    pub appointments: Vec<Appointment>,
    pub associations: Vec<AssociationKey>,
    pub cancellations: Vec<Cancellation>,
    pub bank_details: Vec<BankDetails>,
}

#[derive(Debug)]
struct State {
    token: String,
    data: Fixture,
    requests: Vec<(Method, String)>,
    fail: HashSet<(Method, String)>,
}

type Shared = Arc<Mutex<State>>;

/// A running mock backend. Stops accepting connections when dropped.
#[derive(Debug)]
pub struct MockBackend {
    address: SocketAddr,
    state: Shared,
    shutdown: watch::Sender<()>,
}

impl MockBackend {
    /// Binds an ephemeral port on localhost and starts serving. Requests must carry
    /// `Authorization: Bearer {token}`.
    pub async fn start(token: &str, fixture: Fixture) -> std::io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let address = listener.local_addr()?;
        let state = Arc::new(Mutex::new(State {
            token: token.to_owned(),
            data: fixture,
            requests: Vec::new(),
            fail: HashSet::new(),
        }));
        let (shutdown, mut closed) = watch::channel(());

        let shared = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                select! {
                    accept = listener.accept() => {
                        let (socket, _remote) = match accept {
                            Ok(accepted) => accepted,
                            Err(err) => {
                                error!("failed to accept connection: {err}");
                                continue;
                            }
                        };
                        let state = Arc::clone(&shared);
                        tokio::spawn(async move {
                            let service = hyper::service::service_fn(move |request| {
                                handle(Arc::clone(&state), request)
                            });
                            if let Err(err) = hyper::server::conn::http1::Builder::new()
                                .serve_connection(TokioIo::new(socket), service)
                                .await
                            {
                                error!("failed to serve connection: {err:#}");
                            }
                        });
                    }
                    _ = closed.changed() => break,
                }
            }
            debug!("mock backend stopped");
        });

        info!(%address, "mock backend listening");
        Ok(Self {
            address,
            state,
            shutdown,
        })
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// From now on every request with the old token gets a 401.
    pub fn rotate_token(&self, token: &str) {
        token.clone_into(&mut self.lock().token);
    }

    /// Requests whose path (without query) is `path` answer 500 until [`Self::heal`].
    pub fn fail(&self, method: Method, path: &str) {
        self.lock().fail.insert((method, path.to_owned()));
    }

    pub fn heal(&self) {
        self.lock().fail.clear();
    }

    /// Every request seen so far, as method and path with query.
    #[must_use]
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.lock().requests.clone()
    }

    #[must_use]
    pub fn appointment(&self, study_id: StudyId, id: AppointmentId) -> Option<Appointment> {
        self.lock()
            .data
            .appointments
            .iter()
            .find(|appointment| appointment.study_id == study_id && appointment.id == id)
            .cloned()
    }

    #[must_use]
    pub fn associations(&self, study_id: StudyId) -> Vec<AssociationKey> {
        self.lock()
            .data
            .associations
            .iter()
            .filter(|key| key.study_id() == study_id)
            .cloned()
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.send_replace(());
    }
}

type Reply = Response<Full<Bytes>>;

fn reply(status: StatusCode, body: Bytes) -> Reply {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}

fn empty(status: StatusCode) -> Reply {
    reply(status, Bytes::new())
}

fn json<T: Serialize + ?Sized>(value: &T) -> Reply {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = reply(StatusCode::OK, Bytes::from(body));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, http::HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            Bytes::from(err.to_string()),
        ),
    }
}

fn found<T: Serialize>(value: Option<&T>) -> Reply {
    value.map_or_else(|| empty(StatusCode::NOT_FOUND), json)
}

fn bad_request(message: &str) -> Reply {
    reply(StatusCode::BAD_REQUEST, Bytes::from(message.to_owned()))
}

async fn handle(state: Shared, request: Request<Incoming>) -> Result<Reply, hyper::Error> {
    let (parts, body) = request.into_parts();
    let body = body.collect().await?.to_bytes();
    let path = parts.uri.path().to_owned();
    let query = parts.uri.query().unwrap_or_default().to_owned();

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.requests.push((
        parts.method.clone(),
        parts
            .uri
            .path_and_query()
            .map_or_else(|| path.clone(), ToString::to_string),
    ));

    let expected = format!("Bearer {}", state.token);
    let authorized = parts
        .headers
        .get(AUTHORIZATION)
        .is_some_and(|value| value.as_bytes() == expected.as_bytes());
    if !authorized {
        debug!(method = %parts.method, %path, "rejected token");
        return Ok(empty(StatusCode::UNAUTHORIZED));
    }
    if state.fail.contains(&(parts.method.clone(), path.clone())) {
        return Ok(reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            Bytes::from_static(b"injected failure"),
        ));
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    Ok(route(&mut state.data, &parts.method, &segments, &query, &body))
}

fn id<T: From<u32>>(segment: &str) -> Option<T> {
    segment.parse::<u32>().ok().map(T::from)
}

fn route(
    data: &mut Fixture,
    method: &Method,
    segments: &[&str],
    query: &str,
    body: &[u8],
) -> Reply {
    match (method, segments) {
        (&Method::GET, ["api", "etudes", study]) => {
            let study = id::<StudyId>(study);
            found(data.studies.iter().find(|it| Some(it.id) == study))
        }
        (&Method::GET, ["api", "groupes", group]) => {
            let group = id::<GroupId>(group);
            found(data.groups.iter().find(|it| Some(it.id) == group))
        }
        (&Method::GET, ["api", "volontaires"]) => json(&data.volunteers),
        (&Method::GET, ["api", "volontaires", volunteer]) => {
            let volunteer = id::<VolunteerId>(volunteer);
            found(data.volunteers.iter().find(|it| Some(it.id) == volunteer))
        }
        (&Method::GET, ["api", "infobancaires", "volontaire", volunteer]) => {
            let volunteer = id::<VolunteerId>(volunteer);
            found(
                data.bank_details
                    .iter()
                    .find(|it| Some(it.volunteer_id) == volunteer),
            )
        }
        (&Method::GET, ["api", "rdvs", "etude", study]) => {
            let study = id::<StudyId>(study);
            let appointments: Vec<_> = data
                .appointments
                .iter()
                .filter(|it| Some(it.study_id) == study)
                .collect();
            json(&appointments)
        }
        (&Method::GET, ["api", "rdvs", "volontaire", volunteer]) => {
            let volunteer = id::<VolunteerId>(volunteer);
            let appointments: Vec<_> = data
                .appointments
                .iter()
                .filter(|it| volunteer.is_some() && it.volunteer_id == volunteer)
                .collect();
            json(&appointments)
        }
        (&Method::PUT, ["api", "rdvs", study, appointment]) => {
            update_appointment(data, id(study), id(appointment), body)
        }
        (&Method::GET, ["api", "annulations", "etude", study]) => {
            let study = id::<StudyId>(study);
            let cancellations: Vec<_> = data
                .cancellations
                .iter()
                .filter(|it| Some(it.study_id) == study)
                .collect();
            json(&cancellations)
        }
        (&Method::GET, ["api", "etude-volontaires", "etude", study]) => {
            let study = id::<StudyId>(study);
            let keys: Vec<_> = data
                .associations
                .iter()
                .filter(|it| Some(it.study_id()) == study)
                .collect();
            json(&keys)
        }
        (&Method::POST, ["api", "etude-volontaires"]) => {
            match serde_json::from_slice::<AssociationKey>(body) {
                Ok(key) if data.associations.contains(&key) => bad_request("already registered"),
                Ok(key) => {
                    data.associations.push(key);
                    empty(StatusCode::CREATED)
                }
                Err(err) => bad_request(&err.to_string()),
            }
        }
        (&Method::PATCH, ["api", "etude-volontaires", action]) => {
            update_association(data, action, query)
        }
        (&Method::DELETE, ["api", "etude-volontaires", "delete"]) => {
            let Some(index) = find_association(data, query) else {
                return bad_request("no such association");
            };
            data.associations.remove(index);
            empty(StatusCode::NO_CONTENT)
        }
        (&Method::DELETE, ["api", "etudes", study, "volontaires", volunteer]) => {
            let (study, volunteer) = (id::<StudyId>(study), id::<VolunteerId>(volunteer));
            let before = data.associations.len();
            data.associations.retain(|key| {
                Some(key.study_id()) != study || key.volunteer_id() != volunteer
            });
            if data.associations.len() == before {
                empty(StatusCode::NOT_FOUND)
            } else {
                empty(StatusCode::NO_CONTENT)
            }
        }
        _ => empty(StatusCode::NOT_FOUND),
    }
}

fn update_appointment(
    data: &mut Fixture,
    study: Option<StudyId>,
    appointment: Option<AppointmentId>,
    body: &[u8],
) -> Reply {
    let update = match serde_json::from_slice::<Appointment>(body) {
        Ok(update) => update,
        Err(err) => return bad_request(&err.to_string()),
    };
    if Some(update.study_id) != study || Some(update.id) != appointment {
        return bad_request("ids in path and body differ");
    }
    let Some(stored) = data
        .appointments
        .iter_mut()
        .find(|it| it.study_id == update.study_id && it.id == update.id)
    else {
        return empty(StatusCode::NOT_FOUND);
    };
    *stored = update;
    empty(StatusCode::OK)
}

type Pairs = Vec<(String, String)>;

/// The stored record whose every key field appears in the query with the same value.
fn find_association(data: &Fixture, query: &str) -> Option<usize> {
    let given: Pairs = serde_urlencoded::from_str(query).ok()?;
    data.associations.iter().position(|key| {
        serde_urlencoded::to_string(key)
            .ok()
            .and_then(|encoded| serde_urlencoded::from_str::<Pairs>(&encoded).ok())
            .is_some_and(|wanted| wanted.iter().all(|pair| given.contains(pair)))
    })
}

fn parameter(query: &str, name: &str) -> Option<String> {
    serde_urlencoded::from_str::<Pairs>(query)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}

fn update_association(data: &mut Fixture, action: &str, query: &str) -> Reply {
    let Some(index) = find_association(data, query) else {
        return bad_request("no such association");
    };
    let key = &data.associations[index];
    let number = |name: &str| parameter(query, name).and_then(|value| value.parse::<u32>().ok());

    let updated = match action {
        "update-volontaire" => {
            Some(key.with_volunteer(number("nouveauVolontaireId").map(VolunteerId)))
        }
        "update-numsujet" => number("nouveauNumSujet").map(|value| key.with_subject_number(value)),
        "update-iv" => number("nouvelIV").map(|value| key.with_compensation(value)),
        "update-statut" => parameter(query, "nouveauStatut").map(|value| key.with_status(value)),
        "update-paye" => {
            parameter(query, "nouveauPaye").map(|value| key.with_paid(value == "true"))
        }
        _ => return empty(StatusCode::NOT_FOUND),
    };
    let Some(updated) = updated else {
        return bad_request("missing new value");
    };
    data.associations[index] = updated;
    empty(StatusCode::OK)
}
