//! Test helpers for inbound HTTP components.
//!
//! Provides in-memory implementations of every driven port plus request
//! helpers, so handler tests exercise the full routing/extraction stack
//! without a database or filesystem.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test as actix_test;
use actix_web::{App, web};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::auth::TokenDigest;
use crate::domain::ports::{
    ImageStore, ImageStoreError, LabelPersistenceError, LabelRepository, RecipePersistenceError,
    RecipeRepository, TokenPersistenceError, TokenRepository, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    EmailAddress, Label, LabelId, LabelKind, LabelName, NewUser, ProfileUpdate, Recipe,
    RecipeDraft, RecipeFilter, RecipeId, RecipePatch, User, UserId,
};
use crate::inbound::http::state::HttpState;
use crate::server;

#[derive(Debug, Clone)]
struct StoredUser {
    id: i64,
    email: EmailAddress,
    password_hash: String,
    name: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
}

impl StoredUser {
    fn to_user(&self) -> User {
        User {
            id: UserId::new(self.id),
            email: self.email.clone(),
            password_hash: crate::domain::PasswordHash::from_phc_string(
                self.password_hash.clone(),
            ),
            name: self.name.clone(),
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredLabel {
    id: i64,
    user_id: i64,
    name: String,
}

#[derive(Debug, Clone)]
struct StoredRecipe {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    time_minutes: i32,
    price: BigDecimal,
    link: String,
    image_path: Option<String>,
    tag_ids: Vec<i64>,
    ingredient_ids: Vec<i64>,
}

/// Shared in-memory database backing all port doubles.
#[derive(Debug, Default)]
struct Db {
    next_id: i64,
    users: Vec<StoredUser>,
    tokens: HashMap<Vec<u8>, i64>,
    recipes: Vec<StoredRecipe>,
    tags: Vec<StoredLabel>,
    ingredients: Vec<StoredLabel>,
    files: Vec<String>,
}

impl Db {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn labels(&self, kind: LabelKind) -> &Vec<StoredLabel> {
        match kind {
            LabelKind::Tag => &self.tags,
            LabelKind::Ingredient => &self.ingredients,
        }
    }

    fn labels_mut(&mut self, kind: LabelKind) -> &mut Vec<StoredLabel> {
        match kind {
            LabelKind::Tag => &mut self.tags,
            LabelKind::Ingredient => &mut self.ingredients,
        }
    }

    fn get_or_create_label(&mut self, kind: LabelKind, user_id: i64, name: &str) -> i64 {
        if let Some(existing) = self
            .labels(kind)
            .iter()
            .find(|label| label.user_id == user_id && label.name == name)
        {
            return existing.id;
        }
        let id = self.alloc_id();
        self.labels_mut(kind).push(StoredLabel {
            id,
            user_id,
            name: name.to_owned(),
        });
        id
    }

    fn resolve_labels(&self, kind: LabelKind, ids: &[i64]) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .labels(kind)
            .iter()
            .filter(|label| ids.contains(&label.id))
            .map(|label| Label {
                id: LabelId::new(label.id),
                name: LabelName::new(label.name.clone()).expect("stored names are valid"),
            })
            .collect();
        labels.sort_by_key(|label| label.id);
        labels
    }

    fn to_recipe(&self, stored: &StoredRecipe) -> Recipe {
        Recipe {
            id: RecipeId::new(stored.id),
            title: stored.title.clone(),
            description: stored.description.clone(),
            time_minutes: stored.time_minutes,
            price: stored.price.clone(),
            link: stored.link.clone(),
            image_path: stored.image_path.clone(),
            tags: self.resolve_labels(LabelKind::Tag, &stored.tag_ids),
            ingredients: self.resolve_labels(LabelKind::Ingredient, &stored.ingredient_ids),
        }
    }
}

type SharedDb = Arc<Mutex<Db>>;

fn lock(db: &SharedDb) -> std::sync::MutexGuard<'_, Db> {
    db.lock().expect("test database lock")
}

struct InMemoryUsers(SharedDb);

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn insert(&self, new_user: NewUser) -> Result<User, UserPersistenceError> {
        let mut db = lock(&self.0);
        if db.users.iter().any(|user| user.email == new_user.email) {
            return Err(UserPersistenceError::EmailTaken);
        }
        let id = db.alloc_id();
        let stored = StoredUser {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash.as_str().to_owned(),
            name: new_user.name,
            is_active: true,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
        };
        db.users.push(stored.clone());
        Ok(stored.to_user())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let db = lock(&self.0);
        Ok(db
            .users
            .iter()
            .find(|user| &user.email == email)
            .map(StoredUser::to_user))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let db = lock(&self.0);
        Ok(db
            .users
            .iter()
            .find(|user| user.id == id.as_i64())
            .map(StoredUser::to_user))
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut db = lock(&self.0);
        if let Some(email) = &update.email {
            let taken = db
                .users
                .iter()
                .any(|user| &user.email == email && user.id != id.as_i64());
            if taken {
                return Err(UserPersistenceError::EmailTaken);
            }
        }
        let Some(user) = db.users.iter_mut().find(|user| user.id == id.as_i64()) else {
            return Ok(None);
        };
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash.as_str().to_owned();
        }
        Ok(Some(user.to_user()))
    }
}

struct InMemoryTokens(SharedDb);

#[async_trait]
impl TokenRepository for InMemoryTokens {
    async fn insert(
        &self,
        digest: &TokenDigest,
        user_id: UserId,
    ) -> Result<(), TokenPersistenceError> {
        let mut db = lock(&self.0);
        db.tokens.insert(digest.as_bytes().to_vec(), user_id.as_i64());
        Ok(())
    }

    async fn find_user(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<UserId>, TokenPersistenceError> {
        let db = lock(&self.0);
        Ok(db.tokens.get(digest.as_bytes()).copied().map(UserId::new))
    }
}

struct InMemoryRecipes(SharedDb);

#[async_trait]
impl RecipeRepository for InMemoryRecipes {
    async fn list(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let db = lock(&self.0);
        let mut matches: Vec<&StoredRecipe> = db
            .recipes
            .iter()
            .filter(|recipe| recipe.user_id == owner.as_i64())
            .filter(|recipe| {
                filter.tags.as_ref().is_none_or(|ids| {
                    ids.iter()
                        .any(|id| recipe.tag_ids.contains(&id.as_i64()))
                })
            })
            .filter(|recipe| {
                filter.ingredients.as_ref().is_none_or(|ids| {
                    ids.iter()
                        .any(|id| recipe.ingredient_ids.contains(&id.as_i64()))
                })
            })
            .collect();
        matches.sort_by_key(|recipe| std::cmp::Reverse(recipe.id));
        Ok(matches.into_iter().map(|recipe| db.to_recipe(recipe)).collect())
    }

    async fn find(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let db = lock(&self.0);
        Ok(db
            .recipes
            .iter()
            .find(|recipe| recipe.user_id == owner.as_i64() && recipe.id == id.as_i64())
            .map(|recipe| db.to_recipe(recipe)))
    }

    async fn create(
        &self,
        owner: UserId,
        draft: RecipeDraft,
    ) -> Result<Recipe, RecipePersistenceError> {
        let mut db = lock(&self.0);
        let id = db.alloc_id();
        let tag_ids = draft
            .tags
            .iter()
            .map(|name| db.get_or_create_label(LabelKind::Tag, owner.as_i64(), name.as_str()))
            .collect();
        let ingredient_ids = draft
            .ingredients
            .iter()
            .map(|name| {
                db.get_or_create_label(LabelKind::Ingredient, owner.as_i64(), name.as_str())
            })
            .collect();
        let stored = StoredRecipe {
            id,
            user_id: owner.as_i64(),
            title: draft.title,
            description: draft.description,
            time_minutes: draft.time_minutes,
            price: draft.price,
            link: draft.link,
            image_path: None,
            tag_ids,
            ingredient_ids,
        };
        db.recipes.push(stored);
        let recipe = db
            .recipes
            .last()
            .map(|stored| db.to_recipe(stored))
            .expect("recipe just inserted");
        Ok(recipe)
    }

    async fn update(
        &self,
        owner: UserId,
        id: RecipeId,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut db = lock(&self.0);
        let Some(index) = db
            .recipes
            .iter()
            .position(|recipe| recipe.user_id == owner.as_i64() && recipe.id == id.as_i64())
        else {
            return Ok(None);
        };

        let tag_ids = patch.tags.map(|names| {
            names
                .iter()
                .map(|name| db.get_or_create_label(LabelKind::Tag, owner.as_i64(), name.as_str()))
                .collect::<Vec<_>>()
        });
        let ingredient_ids = patch.ingredients.map(|names| {
            names
                .iter()
                .map(|name| {
                    db.get_or_create_label(LabelKind::Ingredient, owner.as_i64(), name.as_str())
                })
                .collect::<Vec<_>>()
        });

        let recipe = &mut db.recipes[index];
        if let Some(title) = patch.title {
            recipe.title = title;
        }
        if let Some(description) = patch.description {
            recipe.description = description;
        }
        if let Some(time_minutes) = patch.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = patch.price {
            recipe.price = price;
        }
        if let Some(link) = patch.link {
            recipe.link = link;
        }
        if let Some(tag_ids) = tag_ids {
            recipe.tag_ids = tag_ids;
        }
        if let Some(ingredient_ids) = ingredient_ids {
            recipe.ingredient_ids = ingredient_ids;
        }
        let updated = db.to_recipe(&db.recipes[index]);
        Ok(Some(updated))
    }

    async fn delete(&self, owner: UserId, id: RecipeId) -> Result<bool, RecipePersistenceError> {
        let mut db = lock(&self.0);
        let before = db.recipes.len();
        db.recipes
            .retain(|recipe| !(recipe.user_id == owner.as_i64() && recipe.id == id.as_i64()));
        Ok(db.recipes.len() < before)
    }

    async fn set_image(
        &self,
        owner: UserId,
        id: RecipeId,
        image_path: Option<&str>,
    ) -> Result<bool, RecipePersistenceError> {
        let mut db = lock(&self.0);
        let Some(recipe) = db
            .recipes
            .iter_mut()
            .find(|recipe| recipe.user_id == owner.as_i64() && recipe.id == id.as_i64())
        else {
            return Ok(false);
        };
        recipe.image_path = image_path.map(ToOwned::to_owned);
        Ok(true)
    }
}

struct InMemoryLabels {
    db: SharedDb,
    kind: LabelKind,
}

#[async_trait]
impl LabelRepository for InMemoryLabels {
    async fn list(
        &self,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Label>, LabelPersistenceError> {
        let db = lock(&self.db);
        let assigned = |label: &StoredLabel| {
            db.recipes.iter().any(|recipe| match self.kind {
                LabelKind::Tag => recipe.tag_ids.contains(&label.id),
                LabelKind::Ingredient => recipe.ingredient_ids.contains(&label.id),
            })
        };
        let mut labels: Vec<&StoredLabel> = db
            .labels(self.kind)
            .iter()
            .filter(|label| label.user_id == owner.as_i64())
            .filter(|label| !assigned_only || assigned(label))
            .collect();
        labels.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(labels
            .into_iter()
            .map(|label| Label {
                id: LabelId::new(label.id),
                name: LabelName::new(label.name.clone()).expect("stored names are valid"),
            })
            .collect())
    }

    async fn rename(
        &self,
        owner: UserId,
        id: LabelId,
        name: LabelName,
    ) -> Result<Option<Label>, LabelPersistenceError> {
        let mut db = lock(&self.db);
        let duplicate = db.labels(self.kind).iter().any(|label| {
            label.user_id == owner.as_i64()
                && label.name == name.as_str()
                && label.id != id.as_i64()
        });
        if duplicate {
            return Err(LabelPersistenceError::DuplicateName);
        }
        let Some(label) = db
            .labels_mut(self.kind)
            .iter_mut()
            .find(|label| label.user_id == owner.as_i64() && label.id == id.as_i64())
        else {
            return Ok(None);
        };
        label.name = name.as_str().to_owned();
        Ok(Some(Label {
            id: LabelId::new(label.id),
            name,
        }))
    }

    async fn delete(&self, owner: UserId, id: LabelId) -> Result<bool, LabelPersistenceError> {
        let mut db = lock(&self.db);
        let before = db.labels(self.kind).len();
        let raw_id = id.as_i64();
        db.labels_mut(self.kind)
            .retain(|label| !(label.user_id == owner.as_i64() && label.id == raw_id));
        let removed = db.labels(self.kind).len() < before;
        if removed {
            let kind = self.kind;
            for recipe in &mut db.recipes {
                match kind {
                    LabelKind::Tag => recipe.tag_ids.retain(|tag_id| *tag_id != raw_id),
                    LabelKind::Ingredient => {
                        recipe.ingredient_ids.retain(|ing_id| *ing_id != raw_id);
                    }
                }
            }
        }
        Ok(removed)
    }
}

struct InMemoryImages(SharedDb);

#[async_trait]
impl ImageStore for InMemoryImages {
    async fn save(&self, _data: Vec<u8>, extension: &str) -> Result<String, ImageStoreError> {
        let mut db = lock(&self.0);
        let path = format!("recipe/{}.{extension}", Uuid::new_v4());
        db.files.push(path.clone());
        Ok(path)
    }

    async fn remove(&self, path: &str) -> Result<(), ImageStoreError> {
        let mut db = lock(&self.0);
        db.files.retain(|stored| stored != path);
        Ok(())
    }
}

/// Build an [`HttpState`] backed by fresh in-memory doubles.
pub fn in_memory_state() -> HttpState {
    let db = SharedDb::default();
    HttpState {
        users: Arc::new(InMemoryUsers(db.clone())),
        tokens: Arc::new(InMemoryTokens(db.clone())),
        recipes: Arc::new(InMemoryRecipes(db.clone())),
        tags: Arc::new(InMemoryLabels {
            db: db.clone(),
            kind: LabelKind::Tag,
        }),
        ingredients: Arc::new(InMemoryLabels {
            db: db.clone(),
            kind: LabelKind::Ingredient,
        }),
        images: Arc::new(InMemoryImages(db)),
    }
}

/// Initialise the full application against in-memory doubles.
pub async fn init_app()
-> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    actix_test::init_service(
        App::new()
            .app_data(web::Data::new(in_memory_state()))
            .configure(server::configure_api),
    )
    .await
}

/// Attach the bearer token header to a test request.
pub fn authed(request: actix_test::TestRequest, token: &str) -> actix_test::TestRequest {
    request.insert_header(("Authorization", format!("Token {token}")))
}

/// Deserialise a JSON response body.
pub async fn read_json<S>(response: ServiceResponse<S>) -> Value
where
    S: actix_web::body::MessageBody,
{
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON response body")
}

/// Extract the `code` field from an error envelope.
pub async fn read_error_code<S>(response: ServiceResponse<S>) -> String
where
    S: actix_web::body::MessageBody,
{
    let body = read_json(response).await;
    body["code"].as_str().expect("error code").to_owned()
}

/// Register an account through the public endpoint.
pub async fn register<S>(app: &S, email: &str, password: &str)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/user/create")
            .set_json(serde_json::json!({
                "email": email,
                "password": password,
                "name": "Test Name",
            }))
            .to_request(),
    )
    .await;
    assert!(
        response.status().is_success(),
        "registration failed: {}",
        response.status()
    );
}

/// Register and log in, returning the issued token key.
pub async fn register_and_login<S>(app: &S, email: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    register(app, email, password).await;
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/user/token")
            .set_json(serde_json::json!({ "email": email, "password": password }))
            .to_request(),
    )
    .await;
    assert!(
        response.status().is_success(),
        "token issuance failed: {}",
        response.status()
    );
    let body = read_json(response).await;
    body["token"].as_str().expect("token").to_owned()
}

/// Create a recipe and return the detail body.
pub async fn create_recipe<S>(app: &S, token: &str, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(
        app,
        authed(
            actix_test::TestRequest::post().uri("/api/recipe/recipes"),
            token,
        )
        .set_json(payload)
        .to_request(),
    )
    .await;
    assert!(
        response.status().is_success(),
        "recipe creation failed: {}",
        response.status()
    );
    read_json(response).await
}

/// Issue an authenticated GET and return the JSON body.
pub async fn fetch_json<S>(app: &S, token: &str, uri: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(
        app,
        authed(actix_test::TestRequest::get().uri(uri), token).to_request(),
    )
    .await;
    assert!(
        response.status().is_success(),
        "GET {uri} failed: {}",
        response.status()
    );
    read_json(response).await
}
