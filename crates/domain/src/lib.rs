//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod expense_item;
mod group;
mod ids;
mod principal;
mod report;
mod security;
mod user;

pub use access::{AccessDecision, AccessRule, Operation, Ownership, ResourceAccess};
pub use expense_item::{ExpenseItem, ItemAmounts, ItemDetails};
pub use group::{DefaultGroup, GroupName, SUPER_ADMIN_GROUP, default_groups};
pub use ids::{ExpenseItemId, GroupId, ReportId, UserId};
pub use principal::{AuthenticationMethod, Principal};
pub use report::{ExpenseReport, ReportStatus, ReportTransition};
pub use security::{Permission, PermissionSet};
pub use user::{EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, validate_password};
