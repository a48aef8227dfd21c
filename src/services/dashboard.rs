use std::collections::{BTreeMap, HashSet};

use crate::error::AppResult;
use crate::model::{
    document::{DocumentType, EmployeeDocument},
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus},
};
use crate::store::{DocumentRepo, EmployeeRepo, LeaveRepo, Store};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSummary {
    pub total_employees: i64,
    pub total_document_types: i64,
    pub uploaded_documents: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub rejected_leaves: i64,
    pub employees_with_complete_docs: i64,
    pub employees_with_incomplete_docs: i64,
    pub position_distribution: BTreeMap<String, i64>,
    pub documents_need_review: i64,
}

#[derive(Debug, Clone)]
pub struct EmployeeSummary {
    pub employee_id: u64,
    pub total_document_types: i64,
    pub uploaded_documents: i64,
    pub mandatory_docs_uploaded: i64,
    pub mandatory_docs_missing: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub latest_leave_request: Option<LeaveRequest>,
}

/// Splits employees by whether they hold every mandatory document type.
/// Returns `(complete, incomplete)`.
pub fn document_completeness(
    employees: &[Employee],
    types: &[DocumentType],
    documents: &[EmployeeDocument],
) -> (i64, i64) {
    let mandatory: HashSet<u64> = types.iter().filter(|t| t.mandatory).map(|t| t.id).collect();
    if mandatory.is_empty() {
        return (employees.len() as i64, 0);
    }

    let mut held: BTreeMap<u64, HashSet<u64>> = BTreeMap::new();
    for doc in documents.iter().filter(|d| mandatory.contains(&d.document_type_id)) {
        held.entry(doc.employee_id).or_default().insert(doc.document_type_id);
    }

    let complete = employees
        .iter()
        .filter(|e| held.get(&e.id).is_some_and(|h| h.len() == mandatory.len()))
        .count() as i64;
    (complete, employees.len() as i64 - complete)
}

/// Head count per non-blank position.
pub fn position_distribution(employees: &[Employee]) -> BTreeMap<String, i64> {
    let mut counts = BTreeMap::new();
    for position in employees
        .iter()
        .filter_map(|e| e.position.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        *counts.entry(position.to_string()).or_insert(0) += 1;
    }
    counts
}

pub struct Dashboard<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> Dashboard<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn admin(&self) -> AppResult<AdminSummary> {
        let mut tx = self.store.begin().await?;
        let employees = tx.list_employees().await?;
        let types = tx.list_document_types().await?;
        let documents = tx.list_documents().await?;
        let uploaded_documents = tx.count_documents().await?;
        let pending_leaves = tx.count_leaves_by_status(LeaveStatus::Pending).await?;
        let approved_leaves = tx.count_leaves_by_status(LeaveStatus::Approved).await?;
        let rejected_leaves = tx.count_leaves_by_status(LeaveStatus::Rejected).await?;

        let (complete, incomplete) = document_completeness(&employees, &types, &documents);

        Ok(AdminSummary {
            total_employees: employees.len() as i64,
            total_document_types: types.len() as i64,
            uploaded_documents,
            pending_leaves,
            approved_leaves,
            rejected_leaves,
            employees_with_complete_docs: complete,
            employees_with_incomplete_docs: incomplete,
            position_distribution: position_distribution(&employees),
            documents_need_review: incomplete,
        })
    }

    pub async fn employee(&self, employee: &Employee) -> AppResult<EmployeeSummary> {
        let mut tx = self.store.begin().await?;
        let types = tx.list_document_types().await?;
        let documents = tx.list_documents_for_employee(employee.id).await?;
        let leaves = tx.list_leaves_by_employee(employee.id).await?;

        let mandatory_total = types.iter().filter(|t| t.mandatory).count() as i64;
        let mandatory_ids: HashSet<u64> =
            types.iter().filter(|t| t.mandatory).map(|t| t.id).collect();
        let mandatory_uploaded = documents
            .iter()
            .filter(|d| mandatory_ids.contains(&d.document_type_id))
            .count() as i64;

        let count = |status: LeaveStatus| leaves.iter().filter(|l| l.status == status).count() as i64;
        let pending_leaves = count(LeaveStatus::Pending);
        let approved_leaves = count(LeaveStatus::Approved);
        let latest_leave_request = leaves
            .iter()
            .max_by_key(|l| (l.created_at, l.id))
            .cloned();

        Ok(EmployeeSummary {
            employee_id: employee.id,
            total_document_types: types.len() as i64,
            uploaded_documents: documents.len() as i64,
            mandatory_docs_uploaded: mandatory_uploaded,
            mandatory_docs_missing: (mandatory_total - mandatory_uploaded).max(0),
            pending_leaves,
            approved_leaves,
            latest_leave_request,
        })
    }
}
