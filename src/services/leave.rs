use chrono::NaiveDate;

use super::{Page, Paging, check_len};
use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::storage::{Storage, Upload};
use crate::store::{EmployeeRepo, LeaveRepo, Store, Tx};

/// Inclusive day count of a leave range.
pub fn leave_days(start: NaiveDate, end: NaiveDate) -> AppResult<i64> {
    if end < start {
        return Err(AppError::validation("End date must not be before start date"));
    }
    Ok((end - start).num_days() + 1)
}

/// Balance left after approving `days`, never below zero.
pub fn balance_after_approval(balance: i32, days: i64) -> i32 {
    (i64::from(balance) - days).clamp(0, i64::from(i32::MAX)) as i32
}

#[derive(Debug, Clone, Default)]
pub struct LeaveInput {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

pub struct LeaveLedger<'a, S> {
    store: &'a S,
    storage: &'a Storage,
}

impl<'a, S: Store> LeaveLedger<'a, S> {
    pub fn new(store: &'a S, storage: &'a Storage) -> Self {
        Self { store, storage }
    }

    /// Files a PENDING request for `employee`. The balance is checked, not touched.
    pub async fn create(
        &self,
        employee: &Employee,
        input: LeaveInput,
        attachment: Option<Upload>,
    ) -> AppResult<LeaveRequest> {
        let (Some(start_date), Some(end_date)) = (input.start_date, input.end_date) else {
            return Err(AppError::validation("Start date and end date are required"));
        };
        let reason = input.reason.unwrap_or_default();
        if reason.trim().is_empty() {
            return Err(AppError::validation("Reason is required"));
        }
        check_len("Reason", Some(&reason), 500)?;
        let days = leave_days(start_date, end_date)?;

        let mut tx = self.store.begin().await?;
        let current = tx
            .find_employee(employee.id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee", employee.id))?;
        if let Some(remaining) = current.remaining_leave_days {
            if i64::from(remaining) < days {
                return Err(AppError::InsufficientBalance {
                    requested: days,
                    remaining,
                });
            }
        }

        let attachment_path = match attachment.filter(|a| !a.is_empty()) {
            Some(upload) => Some(
                self.storage
                    .store(&upload, &format!("leave-attachments/{}", employee.id))
                    .await?,
            ),
            None => None,
        };

        let saved = insert_and_commit(
            tx,
            NewLeaveRequest {
                employee_id: employee.id,
                start_date,
                end_date,
                reason,
                attachment_path: attachment_path.clone(),
            },
        )
        .await;

        match saved {
            Ok(leave) => {
                tracing::info!(leave_id = leave.id, employee_id = employee.id, days, "Leave request filed");
                Ok(leave)
            }
            Err(e) => {
                if let Some(path) = &attachment_path {
                    self.storage.delete_best_effort(path).await;
                }
                Err(e)
            }
        }
    }

    /// Sets the status; the first transition into APPROVED also draws down the balance.
    pub async fn update_status(&self, request_id: u64, status: LeaveStatus) -> AppResult<LeaveRequest> {
        if status == LeaveStatus::Pending {
            return Err(AppError::validation("Status must be APPROVED or REJECTED"));
        }

        let mut tx = self.store.begin().await?;
        let leave = tx
            .lock_leave(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request", request_id))?;

        if status == LeaveStatus::Approved && leave.status != LeaveStatus::Approved {
            let days = leave_days(leave.start_date, leave.end_date)?;
            let mut employee = tx
                .lock_employee(leave.employee_id)
                .await?
                .ok_or_else(|| AppError::not_found("Employee", leave.employee_id))?;
            if let Some(remaining) = employee.remaining_leave_days {
                let updated = balance_after_approval(remaining, days);
                employee.remaining_leave_days = Some(updated);
                tx.save_employee(&employee).await?;
                tracing::info!(
                    employee_id = employee.id,
                    before = remaining,
                    after = updated,
                    "Leave balance drawn down"
                );
            }
        }

        let updated = tx.set_leave_status(request_id, status).await?;
        tx.commit().await?;
        tracing::info!(leave_id = request_id, from = %leave.status, to = %status, "Leave status changed");
        Ok(updated)
    }

    pub async fn list_by_employee(&self, employee_id: u64) -> AppResult<Vec<LeaveRequest>> {
        let mut tx = self.store.begin().await?;
        tx.list_leaves_by_employee(employee_id).await
    }

    pub async fn list_all(&self) -> AppResult<Vec<LeaveRequest>> {
        let mut tx = self.store.begin().await?;
        tx.list_leaves().await
    }

    pub async fn list_paged(&self, paging: Paging) -> AppResult<Page<LeaveRequest>> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_leaves().await?;
        let items = tx.list_leaves_page(paging.per_page, paging.offset()).await?;
        Ok(Page { items, paging, total })
    }

    pub async fn count_by_status(&self, status: LeaveStatus) -> AppResult<i64> {
        let mut tx = self.store.begin().await?;
        tx.count_leaves_by_status(status).await
    }
}

async fn insert_and_commit<T: Tx>(mut tx: T, leave: NewLeaveRequest) -> AppResult<LeaveRequest> {
    let saved = tx.insert_leave(leave).await?;
    tx.commit().await?;
    Ok(saved)
}
