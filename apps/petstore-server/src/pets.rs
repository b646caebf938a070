//! Demo pets API declared through `api_docs`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use api_docs::{ApiDocs, AppError, Credentials, Principal};
use apidoc::{ApiKeyLocation, AuthRequirement, SchemaType, Server, Tag};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub const API_KEY_SCHEME: &str = "apiKey";
pub const ADMIN_SCHEME: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// Credentials accepted by the demo.
#[derive(Debug, Clone)]
pub struct DemoSecrets {
    pub api_key: String,
    pub admin_user: String,
    pub admin_password: String,
}

impl Default for DemoSecrets {
    fn default() -> Self {
        Self {
            api_key: "special-key".to_string(),
            admin_user: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }
}

#[derive(Default)]
pub struct PetStore {
    pets: RwLock<BTreeMap<u64, Pet>>,
    next_id: AtomicU64,
}

impl PetStore {
    pub fn with_samples() -> Self {
        let store = Self::default();
        store.insert(NewPet {
            name: "Rex".into(),
            tag: Some("dog".into()),
        });
        store.insert(NewPet {
            name: "Tom".into(),
            tag: Some("cat".into()),
        });
        store
    }

    pub fn insert(&self, new: NewPet) -> Pet {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let pet = Pet {
            id,
            name: new.name,
            tag: new.tag,
        };
        self.pets.write().insert(id, pet.clone());
        pet
    }

    pub fn list(&self, limit: Option<usize>) -> Vec<Pet> {
        let pets = self.pets.read();
        pets.values()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<Pet> {
        self.pets.read().get(&id).cloned()
    }

    pub fn remove(&self, id: u64) -> Option<Pet> {
        self.pets.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.pets.read().len()
    }
}

type Store = Arc<PetStore>;

async fn list_pets(State(store): State<Store>, Query(q): Query<ListQuery>) -> Json<Vec<Pet>> {
    Json(store.list(q.limit))
}

async fn get_pet(State(store): State<Store>, Path(id): Path<u64>) -> Result<Json<Pet>, AppError> {
    store
        .get(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("pet {id} not found")))
}

async fn create_pet(
    State(store): State<Store>,
    Extension(principal): Extension<Principal>,
    Json(new): Json<NewPet>,
) -> Result<(StatusCode, Json<Pet>), AppError> {
    if new.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let pet = store.insert(new);
    tracing::info!(id = pet.id, by = %principal.subject, "Created pet");
    Ok((StatusCode::CREATED, Json(pet)))
}

async fn delete_pet(
    State(store): State<Store>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    match store.remove(id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(AppError::NotFound(format!("pet {id} not found"))),
    }
}

async fn stats(State(store): State<Store>) -> String {
    format!("pets={}", store.len())
}

/// Register the demo schemes and declare every pets route on `api`.
pub fn install(api: &ApiDocs, store: Store, secrets: DemoSecrets) -> Result<()> {
    api.configure_doc(|doc| {
        doc.server(Server::new("/").description("This server"))
            .tag(Tag::new("pets").description("Everything about your pets"));
    });

    let api_key = secrets.api_key.clone();
    api.api_key(
        API_KEY_SCHEME,
        ApiKeyLocation::Header,
        move |c: &Credentials| match c {
            Credentials::ApiKey(k) if *k == api_key => Some("api-client".to_string()),
            _ => None,
        },
    )?;
    let (user, password) = (secrets.admin_user, secrets.admin_password);
    api.basic_auth(ADMIN_SCHEME, move |c: &Credentials| match c {
        Credentials::Basic { username, password: p } if *username == user && *p == password => {
            Some(username.clone())
        }
        _ => None,
    })?;

    let example = Pet {
        id: 1,
        name: "Rex".into(),
        tag: Some("dog".into()),
    };
    let new_example = NewPet {
        name: "Rex".into(),
        tag: Some("dog".into()),
    };
    let not_found = serde_json::json!({"code": "not_found", "message": "pet 1 not found"});

    api.routes(|scope| {
        scope.route("/pets", |pets| {
            pets.get("", get(list_pets).with_state(store.clone()), |op| {
                op.operation_id("listPets")
                    .summary("List pets")
                    .tag("pets")
                    .query_param_typed("limit", SchemaType::Integer, false, "How many pets to return")
                    .json_response(200, "A list of pets", &vec![example.clone()])
            })
            .get("/{id}", get(get_pet).with_state(store.clone()), |op| {
                op.operation_id("getPet")
                    .summary("Find pet by id")
                    .tag("pets")
                    .path_param("id", "Pet id")
                    .json_response(200, "The pet", &example)
                    .json_response(404, "Pet not found", &not_found)
            })
            .authenticate(AuthRequirement::new([API_KEY_SCHEME]), |secured| {
                secured.post("", post(create_pet).with_state(store.clone()), |op| {
                    op.operation_id("createPet")
                        .summary("Add a pet")
                        .tag("pets")
                        .json_request(&new_example, "Pet to add")
                        .json_response(201, "Created", &example)
                });
            })
            .authenticate(AuthRequirement::new([ADMIN_SCHEME]), |admin| {
                admin.delete("/{id}", delete(delete_pet).with_state(store.clone()), |op| {
                    op.operation_id("deletePet")
                        .summary("Delete a pet")
                        .tag("pets")
                        .path_param("id", "Pet id")
                        .response(204, "Deleted", None)
                        .json_response(404, "Pet not found", &not_found)
                });
            });
        })
        .undocumented_route("/internal", |internal| {
            internal.get("/stats", get(stats).with_state(store.clone()), |op| {
                op.summary("Store statistics")
                    .text_response(200, "Counters", "pets=2")
            });
        });
    });

    Ok(())
}
