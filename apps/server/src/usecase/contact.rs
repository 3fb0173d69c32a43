//! 連絡先ユースケース
//!
//! 連絡先の CRUD と残高照会を扱う。残高は送金記録の合計として都度計算する。

use std::sync::Arc;

use etransfer_domain::{
    clock::Clock,
    contact::{Contact, ContactId, ContactName, Email},
    money::Money,
};
use etransfer_infra::{
    InfraError,
    repository::{ContactRepository, TransferRepository},
};
use etransfer_shared::{event_log::event, log_business_event};

use crate::error::ServerError;

/// 連絡先作成の入力
pub struct CreateContactInput {
    pub name:  String,
    pub email: String,
}

/// 連絡先更新の入力
pub struct UpdateContactInput {
    pub contact_id: ContactId,
    pub name:       String,
    pub email:      String,
}

/// 連絡先ユースケース
pub struct ContactUseCaseImpl {
    contact_repository:  Arc<dyn ContactRepository>,
    transfer_repository: Arc<dyn TransferRepository>,
    clock:               Arc<dyn Clock>,
}

impl ContactUseCaseImpl {
    pub fn new(
        contact_repository: Arc<dyn ContactRepository>,
        transfer_repository: Arc<dyn TransferRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            contact_repository,
            transfer_repository,
            clock,
        }
    }

    /// 連絡先を名前順で取得する（名前・メールアドレスの部分一致で絞り込み可）
    pub async fn list_contacts(&self, search: Option<&str>) -> Result<Vec<Contact>, ServerError> {
        Ok(self.contact_repository.find_all(search).await?)
    }

    /// 連絡先を取得する
    pub async fn get_contact(&self, contact_id: &ContactId) -> Result<Contact, ServerError> {
        self.contact_repository
            .find_by_id(contact_id)
            .await?
            .ok_or_else(|| contact_not_found(contact_id))
    }

    /// 連絡先と残高を取得する
    pub async fn get_contact_with_balance(
        &self,
        contact_id: &ContactId,
    ) -> Result<(Contact, Money), ServerError> {
        let contact = self.get_contact(contact_id).await?;
        let balance = self.transfer_repository.sum_by_contact(contact_id).await?;
        Ok((contact, balance))
    }

    /// 残高を取得する
    ///
    /// 送金記録がなければゼロ。連絡先が存在しなければ NotFound。
    pub async fn get_balance(&self, contact_id: &ContactId) -> Result<Money, ServerError> {
        self.get_contact_with_balance(contact_id)
            .await
            .map(|(_, balance)| balance)
    }

    /// 連絡先を作成する
    ///
    /// 同じメールアドレスの連絡先があれば Conflict。
    pub async fn create_contact(&self, input: CreateContactInput) -> Result<Contact, ServerError> {
        let contact = Contact::new(
            ContactId::new(),
            ContactName::new(input.name)?,
            Email::new(input.email)?,
            self.clock.now(),
        );

        self.contact_repository
            .insert(&contact)
            .await
            .map_err(map_email_conflict)?;

        log_business_event!(
            event.category = event::category::CONTACT,
            event.action = event::action::CONTACT_CREATED,
            event.entity_type = event::entity_type::CONTACT,
            event.entity_id = %contact.id(),
            event.result = event::result::SUCCESS,
            "連絡先を作成しました"
        );

        Ok(contact)
    }

    /// 連絡先の名前とメールアドレスを更新する
    pub async fn update_contact(&self, input: UpdateContactInput) -> Result<Contact, ServerError> {
        let name = ContactName::new(input.name)?;
        let email = Email::new(input.email)?;
        let contact = self
            .get_contact(&input.contact_id)
            .await?
            .edited(name, email, self.clock.now());

        self.contact_repository
            .update(&contact)
            .await
            .map_err(map_email_conflict)?;

        log_business_event!(
            event.category = event::category::CONTACT,
            event.action = event::action::CONTACT_UPDATED,
            event.entity_type = event::entity_type::CONTACT,
            event.entity_id = %contact.id(),
            event.result = event::result::SUCCESS,
            "連絡先を更新しました"
        );

        Ok(contact)
    }

    /// 連絡先を削除する
    ///
    /// 送金記録が残っている連絡先は削除できない（Conflict）。
    pub async fn delete_contact(&self, contact_id: &ContactId) -> Result<(), ServerError> {
        let deleted = self
            .contact_repository
            .delete(contact_id)
            .await
            .map_err(|e| {
                if e.is_foreign_key_violation() {
                    ServerError::Conflict(
                        "送金記録が残っている連絡先は削除できません".to_string(),
                    )
                } else {
                    ServerError::from(e)
                }
            })?;

        if !deleted {
            return Err(contact_not_found(contact_id));
        }

        log_business_event!(
            event.category = event::category::CONTACT,
            event.action = event::action::CONTACT_DELETED,
            event.entity_type = event::entity_type::CONTACT,
            event.entity_id = %contact_id,
            event.result = event::result::SUCCESS,
            "連絡先を削除しました"
        );

        Ok(())
    }
}

pub(crate) fn contact_not_found(contact_id: &ContactId) -> ServerError {
    ServerError::NotFound(format!("連絡先が見つかりません: {contact_id}"))
}

fn map_email_conflict(err: InfraError) -> ServerError {
    match err.as_conflict() {
        Some(("contacts_email_key", _)) => {
            ServerError::Conflict("このメールアドレスは既に登録されています".to_string())
        }
        _ => ServerError::from(err),
    }
}
