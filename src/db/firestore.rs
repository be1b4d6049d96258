// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles and access flags)
//! - Contributions (coffee purchases)
//! - Products (catalog with cached averages)
//! - Votes (one rating per user and product)
//! - Settings (singleton configuration document)

use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Contribution, Product, Settings, User, Vote};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes an unauthenticated connection; skip credential lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their Google subject ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write only `fields` of an existing user.
    ///
    /// Returns `false` when the user no longer exists; nothing is written then.
    pub async fn update_user_fields(&self, user: &User, fields: &[&str]) -> Result<bool, AppError> {
        self.update_fields(collections::USERS, &user.id, user, fields)
            .await
    }

    /// All users, ordered by name.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users with `isActive == true`, ordered by name.
    pub async fn list_active_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("isActive").eq(true)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here so the query needs no composite index.
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    /// Whether any user currently holds the admin flag.
    pub async fn any_admin_exists(&self) -> Result<bool, AppError> {
        let admins: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("isAdmin").eq(true)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(!admins.is_empty())
    }

    // ─── Contribution Operations ─────────────────────────────────

    /// Get a contribution by ID.
    pub async fn get_contribution(&self, id: &str) -> Result<Option<Contribution>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CONTRIBUTIONS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a contribution.
    pub async fn set_contribution(&self, contribution: &Contribution) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CONTRIBUTIONS)
            .document_id(&contribution.id)
            .object(contribution)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a contribution.
    pub async fn delete_contribution(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CONTRIBUTIONS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All contributions, newest purchase first.
    pub async fn list_contributions(&self) -> Result<Vec<Contribution>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CONTRIBUTIONS)
            .order_by([(
                "purchaseDate",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Contributions bought by one user, newest purchase first.
    pub async fn list_contributions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Contribution>, AppError> {
        self.list_contributions_where("userId", user_id).await
    }

    /// Contributions of one product, newest purchase first.
    pub async fn list_contributions_for_product(
        &self,
        product_id: &str,
    ) -> Result<Vec<Contribution>, AppError> {
        self.list_contributions_where("productId", product_id)
            .await
    }

    async fn list_contributions_where(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<Contribution>, AppError> {
        let value = value.to_string();
        let mut contributions: Vec<Contribution> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CONTRIBUTIONS)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        contributions.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        Ok(contributions)
    }

    // ─── Product Operations ──────────────────────────────────────

    /// Get a product by ID.
    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PRODUCTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a product.
    pub async fn set_product(&self, product: &Product) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PRODUCTS)
            .document_id(&product.id)
            .object(product)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write only `fields` of an existing product.
    ///
    /// Returns `false` when the product was deleted meanwhile, so a late
    /// average refresh never brings it back.
    pub async fn update_product_fields(
        &self,
        product: &Product,
        fields: &[&str],
    ) -> Result<bool, AppError> {
        self.update_fields(collections::PRODUCTS, &product.id, product, fields)
            .await
    }

    /// All products, ordered by name.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PRODUCTS)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a product together with its votes.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_product(&self, id: &str) -> Result<usize, AppError> {
        let votes = self.list_votes_for_product(id).await?;
        let count = votes.len();

        self.batch_delete(&votes, collections::VOTES, |vote: &Vote| {
            Vote::doc_id(&vote.user_id, &vote.product_id)
        })
        .await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PRODUCTS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(product_id = id, votes = count, "Product deleted");
        Ok(count + 1)
    }

    // ─── Vote Operations ─────────────────────────────────────────

    /// Create or replace the caller's rating of a product.
    pub async fn upsert_vote(&self, vote: &Vote) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::VOTES)
            .document_id(Vote::doc_id(&vote.user_id, &vote.product_id))
            .object(vote)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Every rating a user has given.
    pub async fn list_votes_for_user(&self, user_id: &str) -> Result<Vec<Vote>, AppError> {
        self.list_votes_where("userId", user_id).await
    }

    /// Every rating a product has received.
    pub async fn list_votes_for_product(&self, product_id: &str) -> Result<Vec<Vote>, AppError> {
        self.list_votes_where("productId", product_id).await
    }

    async fn list_votes_where(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<Vote>, AppError> {
        let value = value.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::VOTES)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Settings Operations ─────────────────────────────────────

    /// Stored settings, or the defaults when none were saved yet.
    pub async fn get_settings(&self) -> Result<Settings, AppError> {
        let settings: Option<Settings> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CONFIGURATION)
            .obj()
            .one(collections::SETTINGS_DOC)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(settings.unwrap_or_default())
    }

    /// Replace the settings document.
    pub async fn set_settings(&self, settings: &Settings) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CONFIGURATION)
            .document_id(collections::SETTINGS_DOC)
            .object(settings)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Helper Methods ──────────────────────────────────────────

    /// Field-masked update guarded by an exists precondition.
    async fn update_fields<T>(
        &self,
        collection: &str,
        id: &str,
        object: &T,
        fields: &[&str],
    ) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let result: Result<T, FirestoreError> = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields.iter().copied())
            .in_col(collection)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(id)
            .object(object)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataNotFoundError(_)) => {
                tracing::debug!(collection, id, "Skipping update of missing document");
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
