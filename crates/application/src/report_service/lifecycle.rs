use super::*;

impl ReportService {
    /// Creates a draft report owned by the caller.
    pub async fn create_report(&self, principal: &Principal, title: &str) -> AppResult<ExpenseReport> {
        self.gate
            .authorize(principal, Operation::CreateReport, AccessTarget::None)
            .await?;

        let report = ExpenseReport::draft(principal.user_id(), title, Utc::now())?;
        self.repository.create_report(&report).await?;
        Ok(report)
    }

    /// Lists the caller's reports with their items, newest first.
    pub async fn list_own_reports(&self, principal: &Principal) -> AppResult<Vec<ReportDetails>> {
        self.gate
            .authorize(principal, Operation::ListOwnReports, AccessTarget::None)
            .await?;

        self.repository
            .list_reports_for_owner(principal.user_id())
            .await
    }

    /// Returns one report with its items.
    pub async fn view_report(
        &self,
        principal: &Principal,
        report_id: ReportId,
    ) -> AppResult<ReportDetails> {
        self.gate
            .authorize(principal, Operation::ViewReport, AccessTarget::Report(report_id))
            .await?;

        self.load_report(report_id).await
    }

    /// Hands a draft report over for review.
    pub async fn submit_report(
        &self,
        principal: &Principal,
        report_id: ReportId,
    ) -> AppResult<ExpenseReport> {
        self.transition(
            principal,
            report_id,
            Operation::SubmitReport,
            ReportTransition::Submit,
        )
        .await
    }

    /// Approves a submitted report.
    pub async fn approve_report(
        &self,
        principal: &Principal,
        report_id: ReportId,
    ) -> AppResult<ExpenseReport> {
        self.transition(
            principal,
            report_id,
            Operation::ApproveReport,
            ReportTransition::Approve,
        )
        .await
    }

    /// Rejects a submitted report.
    pub async fn reject_report(
        &self,
        principal: &Principal,
        report_id: ReportId,
    ) -> AppResult<ExpenseReport> {
        self.transition(
            principal,
            report_id,
            Operation::RejectReport,
            ReportTransition::Reject,
        )
        .await
    }

    /// Deletes a draft report together with its items.
    pub async fn delete_report(&self, principal: &Principal, report_id: ReportId) -> AppResult<()> {
        self.gate
            .authorize(principal, Operation::DeleteReport, AccessTarget::Report(report_id))
            .await?;

        if !self.repository.delete_draft_report(report_id).await? {
            return Err(self
                .report_write_lost(report_id, Operation::DeleteReport)
                .await);
        }

        Ok(())
    }

    /// Lists every report that has left `draft`, with owner emails.
    pub async fn list_reviewable_reports(
        &self,
        principal: &Principal,
    ) -> AppResult<Vec<ReportOverview>> {
        self.gate
            .authorize(
                principal,
                Operation::ListReviewableReports,
                AccessTarget::None,
            )
            .await?;

        self.repository.list_reviewable_reports().await
    }

    /// Exports every report with its items.
    pub async fn export_reports(&self, principal: &Principal) -> AppResult<Vec<ReportOverview>> {
        self.gate
            .authorize(principal, Operation::ExportReports, AccessTarget::None)
            .await?;

        self.repository.list_all_reports().await
    }

    async fn transition(
        &self,
        principal: &Principal,
        report_id: ReportId,
        operation: Operation,
        transition: ReportTransition,
    ) -> AppResult<ExpenseReport> {
        let access = self
            .gate
            .authorize(principal, operation, AccessTarget::Report(report_id))
            .await?;

        let from = access
            .resource
            .map(|resource| resource.status)
            .unwrap_or(transition.source());
        let to = from.apply(transition)?;

        if !self
            .repository
            .transition_status(report_id, from, to)
            .await?
        {
            return Err(self.report_write_lost(report_id, operation).await);
        }

        Ok(self.load_report(report_id).await?.report)
    }
}

