use std::collections::BTreeMap;

use super::{Page, Paging, check_len, require_text};
use crate::error::{AppError, AppResult};
use crate::model::document::{DocumentType, DocumentTypeInput, EmployeeDocument, NewEmployeeDocument};
use crate::model::employee::Employee;
use crate::storage::{DOCUMENT_EXTENSIONS, Storage, Upload};
use crate::store::{DocumentRepo, Store, Tx};

fn validate_type(input: &DocumentTypeInput) -> AppResult<DocumentTypeInput> {
    require_text("Name", &input.name, 150)?;
    check_len("Description", input.description.as_deref(), 500)?;
    Ok(DocumentTypeInput {
        name: input.name.trim().to_string(),
        description: input.description.clone(),
        mandatory: input.mandatory,
    })
}

/// An employee's uploads plus the mandatory types they still owe.
#[derive(Debug, Clone)]
pub struct EmployeeDocuments {
    pub documents: Vec<EmployeeDocument>,
    pub missing_mandatory: Vec<DocumentType>,
}

#[derive(Debug, Clone)]
pub struct DocumentGroup {
    pub employee_id: u64,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub documents: Vec<EmployeeDocument>,
}

/// Mandatory types with no upload among `documents`.
pub fn missing_mandatory(types: &[DocumentType], documents: &[EmployeeDocument]) -> Vec<DocumentType> {
    types
        .iter()
        .filter(|t| t.mandatory)
        .filter(|t| !documents.iter().any(|d| d.document_type_id == t.id))
        .cloned()
        .collect()
}

/// Groups documents by employee, ascending by employee id.
pub fn group_by_employee(documents: Vec<EmployeeDocument>) -> Vec<DocumentGroup> {
    let mut groups: BTreeMap<u64, DocumentGroup> = BTreeMap::new();
    for doc in documents {
        groups
            .entry(doc.employee_id)
            .or_insert_with(|| DocumentGroup {
                employee_id: doc.employee_id,
                employee_name: doc.employee_name.clone(),
                employee_email: doc.employee_email.clone(),
                documents: Vec::new(),
            })
            .documents
            .push(doc);
    }
    groups.into_values().collect()
}

pub struct Documents<'a, S> {
    store: &'a S,
    storage: &'a Storage,
}

impl<'a, S: Store> Documents<'a, S> {
    pub fn new(store: &'a S, storage: &'a Storage) -> Self {
        Self { store, storage }
    }

    pub async fn list_types(&self) -> AppResult<Vec<DocumentType>> {
        let mut tx = self.store.begin().await?;
        tx.list_document_types().await
    }

    pub async fn list_types_paged(&self, paging: Paging) -> AppResult<Page<DocumentType>> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_document_types().await?;
        let items = tx
            .list_document_types_page(paging.per_page, paging.offset())
            .await?;
        Ok(Page { items, paging, total })
    }

    pub async fn get_type(&self, id: u64) -> AppResult<DocumentType> {
        let mut tx = self.store.begin().await?;
        tx.find_document_type(id)
            .await?
            .ok_or_else(|| AppError::not_found("Document type", id))
    }

    pub async fn create_type(&self, input: DocumentTypeInput) -> AppResult<DocumentType> {
        let input = validate_type(&input)?;
        let mut tx = self.store.begin().await?;
        if tx.document_type_name_taken(&input.name).await? {
            return Err(AppError::Conflict("Document type name already exists".into()));
        }
        let created = tx.insert_document_type(input).await?;
        tx.commit().await?;
        tracing::info!(type_id = created.id, name = %created.name, "Document type created");
        Ok(created)
    }

    pub async fn update_type(&self, id: u64, input: DocumentTypeInput) -> AppResult<DocumentType> {
        let input = validate_type(&input)?;
        let mut tx = self.store.begin().await?;
        let current = tx
            .find_document_type(id)
            .await?
            .ok_or_else(|| AppError::not_found("Document type", id))?;
        let renamed = !current.name.eq_ignore_ascii_case(&input.name);
        if renamed && tx.document_type_name_taken(&input.name).await? {
            return Err(AppError::Conflict("Document type name already exists".into()));
        }
        let updated = tx.update_document_type(id, input).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes the type together with every upload of it.
    pub async fn delete_type(&self, id: u64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        if tx.find_document_type(id).await?.is_none() {
            return Err(AppError::not_found("Document type", id));
        }
        let orphaned = tx.list_documents_by_type(id).await?;
        tx.delete_document_type(id).await?;
        tx.commit().await?;

        for doc in &orphaned {
            self.storage.delete_best_effort(&doc.stored_path).await;
        }
        tracing::info!(type_id = id, removed_uploads = orphaned.len(), "Document type deleted");
        Ok(())
    }

    pub async fn list_for_employee(&self, employee: &Employee) -> AppResult<EmployeeDocuments> {
        let mut tx = self.store.begin().await?;
        let documents = tx.list_documents_for_employee(employee.id).await?;
        let types = tx.list_document_types().await?;
        Ok(EmployeeDocuments {
            missing_mandatory: missing_mandatory(&types, &documents),
            documents,
        })
    }

    /// Stores the file for `type_id`, replacing the employee's earlier upload of that type.
    pub async fn upload(&self, employee: &Employee, type_id: u64, upload: Upload) -> AppResult<EmployeeDocument> {
        let mut tx = self.store.begin().await?;
        if tx.find_document_type(type_id).await?.is_none() {
            return Err(AppError::not_found("Document type", type_id));
        }
        upload.require_extension(DOCUMENT_EXTENSIONS, "Only pdf, jpg, jpeg, png allowed")?;

        let previous = tx.find_document_for(employee.id, type_id).await?;
        let stored_path = self
            .storage
            .store(&upload, &format!("employee-docs/{}", employee.id))
            .await?;

        let doc = NewEmployeeDocument {
            employee_id: employee.id,
            document_type_id: type_id,
            original_filename: upload.filename.clone().unwrap_or_default(),
            stored_path: stored_path.clone(),
            content_type: upload
                .content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size: upload.size(),
        };

        match replace_and_commit(tx, previous.as_ref().map(|p| p.id), doc).await {
            Ok(saved) => {
                if let Some(old) = &previous {
                    self.storage.delete_best_effort(&old.stored_path).await;
                }
                tracing::info!(employee_id = employee.id, type_id, document_id = saved.id, "Document uploaded");
                Ok(saved)
            }
            Err(e) => {
                self.storage.delete_best_effort(&stored_path).await;
                Err(e)
            }
        }
    }

    pub async fn delete_own(&self, employee: &Employee, document_id: u64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let doc = tx
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document", document_id))?;
        if doc.employee_id != employee.id {
            return Err(AppError::Forbidden(
                "Cannot delete document of other employee".into(),
            ));
        }
        tx.delete_document(document_id).await?;
        tx.commit().await?;
        self.storage.delete_best_effort(&doc.stored_path).await;
        Ok(())
    }

    /// Admin view: uploads grouped per employee, optionally for one type.
    pub async fn grouped_uploads(&self, type_id: Option<u64>) -> AppResult<Vec<DocumentGroup>> {
        let mut tx = self.store.begin().await?;
        let documents = match type_id {
            Some(id) => {
                if tx.find_document_type(id).await?.is_none() {
                    return Err(AppError::not_found("Document type", id));
                }
                tx.list_documents_by_type(id).await?
            }
            None => tx.list_documents().await?,
        };
        Ok(group_by_employee(documents))
    }
}

async fn replace_and_commit<T: Tx>(
    mut tx: T,
    previous_id: Option<u64>,
    doc: NewEmployeeDocument,
) -> AppResult<EmployeeDocument> {
    if let Some(id) = previous_id {
        tx.delete_document(id).await?;
    }
    let saved = tx.insert_document(doc).await?;
    tx.commit().await?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Fixture, upload};

    fn doc_type(name: &str, mandatory: bool) -> DocumentTypeInput {
        DocumentTypeInput {
            name: name.into(),
            description: None,
            mandatory,
        }
    }

    #[tokio::test]
    async fn type_names_are_unique_ignoring_case() {
        let fx = Fixture::new();
        let docs = Documents::new(&fx.store, &fx.storage);

        let ktp = docs.create_type(doc_type("  KTP ", true)).await.unwrap();
        assert_eq!(ktp.name, "KTP");
        assert!(matches!(
            docs.create_type(doc_type("ktp", false)).await,
            Err(AppError::Conflict(_))
        ));

        let npwp = docs.create_type(doc_type("NPWP", false)).await.unwrap();
        assert!(matches!(
            docs.update_type(npwp.id, doc_type("Ktp", false)).await,
            Err(AppError::Conflict(_))
        ));
        // Re-saving under its own name with different case is fine.
        let renamed = docs.update_type(ktp.id, doc_type("ktp", true)).await.unwrap();
        assert_eq!(renamed.name, "ktp");

        assert!(matches!(
            docs.create_type(doc_type(" ", false)).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(docs.list_types().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn upload_replaces_same_type_and_reports_missing() {
        let fx = Fixture::new();
        let emp = fx.employee("Putri", None).await;
        let docs = Documents::new(&fx.store, &fx.storage);
        let ktp = docs.create_type(doc_type("KTP", true)).await.unwrap();
        let ijazah = docs.create_type(doc_type("Ijazah", true)).await.unwrap();
        docs.create_type(doc_type("Optional", false)).await.unwrap();

        let listed = docs.list_for_employee(&emp).await.unwrap();
        assert_eq!(listed.missing_mandatory.len(), 2);

        let first = docs.upload(&emp, ktp.id, upload("ktp.pdf", b"v1")).await.unwrap();
        let second = docs.upload(&emp, ktp.id, upload("ktp.png", b"v2")).await.unwrap();
        assert_eq!(second.document_type_name.as_deref(), Some("KTP"));
        assert!(fx.storage.read(&first.stored_path).await.is_err());
        assert_eq!(fx.storage.read(&second.stored_path).await.unwrap(), b"v2");

        let listed = docs.list_for_employee(&emp).await.unwrap();
        assert_eq!(listed.documents.len(), 1);
        assert_eq!(
            listed.missing_mandatory.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![ijazah.id]
        );
    }

    #[tokio::test]
    async fn upload_rejects_unknown_type_and_extension() {
        let fx = Fixture::new();
        let emp = fx.employee("Rudi", None).await;
        let docs = Documents::new(&fx.store, &fx.storage);
        let ktp = docs.create_type(doc_type("KTP", true)).await.unwrap();

        assert!(matches!(
            docs.upload(&emp, 999, upload("a.pdf", b"x")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            docs.upload(&emp, ktp.id, upload("a.exe", b"x")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            docs.upload(&emp, ktp.id, upload("a.pdf", b"")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let fx = Fixture::new();
        let owner = fx.employee("Sinta", None).await;
        let other = fx.employee("Tono", None).await;
        let docs = Documents::new(&fx.store, &fx.storage);
        let ktp = docs.create_type(doc_type("KTP", true)).await.unwrap();
        let doc = docs.upload(&owner, ktp.id, upload("k.pdf", b"x")).await.unwrap();

        assert!(matches!(
            docs.delete_own(&other, doc.id).await,
            Err(AppError::Forbidden(_))
        ));
        docs.delete_own(&owner, doc.id).await.unwrap();
        assert!(fx.storage.read(&doc.stored_path).await.is_err());
        assert!(matches!(
            docs.delete_own(&owner, doc.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn admin_grouping_is_by_employee_ascending() {
        let fx = Fixture::new();
        let a = fx.employee("Umar", None).await;
        let b = fx.employee("Vina", None).await;
        let docs = Documents::new(&fx.store, &fx.storage);
        let ktp = docs.create_type(doc_type("KTP", true)).await.unwrap();
        let npwp = docs.create_type(doc_type("NPWP", false)).await.unwrap();

        docs.upload(&b, ktp.id, upload("b.pdf", b"x")).await.unwrap();
        docs.upload(&a, npwp.id, upload("a2.pdf", b"x")).await.unwrap();
        docs.upload(&a, ktp.id, upload("a1.pdf", b"x")).await.unwrap();

        let groups = docs.grouped_uploads(None).await.unwrap();
        assert_eq!(groups.iter().map(|g| g.employee_id).collect::<Vec<_>>(), vec![a.id, b.id]);
        assert_eq!(groups[0].documents.len(), 2);
        assert_eq!(groups[0].employee_name.as_deref(), Some("Umar"));

        let only_npwp = docs.grouped_uploads(Some(npwp.id)).await.unwrap();
        assert_eq!(only_npwp.len(), 1);
        assert_eq!(only_npwp[0].employee_id, a.id);

        assert!(matches!(
            docs.grouped_uploads(Some(404)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_type_removes_its_uploads() {
        let fx = Fixture::new();
        let emp = fx.employee("Wati", None).await;
        let docs = Documents::new(&fx.store, &fx.storage);
        let ktp = docs.create_type(doc_type("KTP", true)).await.unwrap();
        let doc = docs.upload(&emp, ktp.id, upload("k.pdf", b"x")).await.unwrap();

        docs.delete_type(ktp.id).await.unwrap();
        assert!(docs.list_for_employee(&emp).await.unwrap().documents.is_empty());
        assert!(fx.storage.read(&doc.stored_path).await.is_err());
        assert!(matches!(docs.get_type(ktp.id).await, Err(AppError::NotFound(_))));
    }
}
