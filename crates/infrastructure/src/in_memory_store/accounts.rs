use super::*;

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserSummary>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(UserRecord::summary))
    }

    async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .map(UserRecord::summary)
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<UserSummary> {
        let mut state = self.state.write().await;

        if state
            .users
            .iter()
            .any(|existing| existing.email == user.email.as_str())
        {
            return Err(AppError::Conflict(format!(
                "user with email '{}' already exists",
                user.email
            )));
        }
        if let Some(missing) = user
            .group_ids
            .iter()
            .find(|group_id| !state.groups.iter().any(|group| group.id == **group_id))
        {
            return Err(AppError::Validation(format!("unknown group '{missing}'")));
        }

        let record = UserRecord {
            id: UserId::new(),
            email: user.email.as_str().to_owned(),
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        for group in &mut state.groups {
            if user.group_ids.contains(&group.id) && !group.members.contains(&record.id) {
                group.members.push(record.id);
            }
        }

        let summary = record.summary();
        state.users.push(record);
        Ok(summary)
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryStore {
    async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
        let mut permissions: Vec<Permission> = self
            .state
            .read()
            .await
            .groups
            .iter()
            .filter(|group| group.members.contains(&user_id))
            .flat_map(|group| group.permissions.iter().copied())
            .collect();
        permissions.sort();
        permissions.dedup();
        Ok(permissions)
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn list_groups(&self) -> AppResult<Vec<GroupRecord>> {
        let mut groups: Vec<GroupRecord> = self
            .state
            .read()
            .await
            .groups
            .iter()
            .map(StoredGroup::record)
            .collect();
        groups.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(groups)
    }

    async fn create_group(&self, name: &GroupName) -> AppResult<GroupRecord> {
        let mut state = self.state.write().await;
        if state.groups.iter().any(|group| group.name == name.as_str()) {
            return Err(AppError::Conflict(format!(
                "group '{}' already exists",
                name.as_str()
            )));
        }

        let group = StoredGroup {
            id: GroupId::new(),
            name: name.as_str().to_owned(),
            permissions: Vec::new(),
            members: Vec::new(),
        };
        let record = group.record();
        state.groups.push(group);
        Ok(record)
    }

    async fn grant_permissions(
        &self,
        group_id: GroupId,
        permissions: &[Permission],
    ) -> AppResult<GroupRecord> {
        let mut state = self.state.write().await;
        let group = state.group_mut(group_id)?;
        group.grant(permissions);
        Ok(group.record())
    }

    async fn add_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.users.iter().any(|user| user.id == user_id) {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }

        let group = state.group_mut(group_id)?;
        if !group.members.contains(&user_id) {
            group.members.push(user_id);
        }
        Ok(())
    }

    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(group) = state.groups.iter_mut().find(|group| group.id == group_id) else {
            return Ok(false);
        };

        let before = group.members.len();
        group.members.retain(|member| *member != user_id);
        Ok(group.members.len() != before)
    }
}

#[async_trait]
impl ApiTokenRepository for InMemoryStore {
    async fn store_token_hash(&self, user_id: UserId, token_hash: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.users.iter().any(|user| user.id == user_id) {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }
        if state.api_tokens.contains_key(token_hash) {
            return Err(AppError::Conflict("api token already exists".to_owned()));
        }

        state.api_tokens.insert(token_hash.to_owned(), user_id);
        Ok(())
    }

    async fn find_user_by_token_hash(&self, token_hash: &str) -> AppResult<Option<UserId>> {
        Ok(self.state.read().await.api_tokens.get(token_hash).copied())
    }
}

#[async_trait]
impl BootstrapRepository for InMemoryStore {
    async fn has_users(&self) -> AppResult<bool> {
        Ok(!self.state.read().await.users.is_empty())
    }

    async fn seed(&self, plan: &SeedPlan) -> AppResult<SeedOutcome> {
        let mut state = self.state.write().await;

        for permission in plan.permissions {
            if !state.catalog.contains(permission) {
                state.catalog.push(*permission);
            }
        }

        for default_group in plan.groups {
            match state
                .groups
                .iter_mut()
                .find(|group| group.name == default_group.name)
            {
                Some(group) => group.grant(default_group.permissions),
                None => state.groups.push(StoredGroup {
                    id: GroupId::new(),
                    name: default_group.name.to_owned(),
                    permissions: default_group.permissions.to_vec(),
                    members: Vec::new(),
                }),
            }
        }

        let mut outcome = SeedOutcome::default();
        if let Some(administrator) = &plan.administrator
            && state.users.is_empty()
        {
            let user_id = UserId::new();
            state.users.push(UserRecord {
                id: user_id,
                email: administrator.email.as_str().to_owned(),
                password_hash: administrator.password_hash.clone(),
                created_at: Utc::now(),
            });
            if let Some(group) = state
                .groups
                .iter_mut()
                .find(|group| group.name == SUPER_ADMIN_GROUP)
            {
                group.members.push(user_id);
            }
            outcome.administrator_created = true;
        }

        Ok(outcome)
    }
}
