use api_types::transaction::{Transaction, TransactionNew, TransactionUpdate};

use crate::store::{CrudStore, Resource};

const AMOUNT_INVALID: &str = "Please enter a valid amount";
const CATEGORY_REQUIRED: &str = "Please select a category";

pub type TransactionStore = CrudStore<Transaction>;

impl Resource for Transaction {
    type New = TransactionNew;
    type Patch = TransactionUpdate;

    const PATH: &'static str = "/api/transactions";
    const NOUN: &'static str = "Transaction";
    const PLURAL: &'static str = "transactions";

    fn id(&self) -> &str {
        &self.id
    }

    fn check_new(data: &TransactionNew) -> Result<(), String> {
        check_amount(data.amount)?;
        check_category(&data.category_id)
    }

    fn check_patch(_current: Option<&Self>, patch: &TransactionUpdate) -> Result<(), String> {
        if let Some(amount) = patch.amount {
            check_amount(amount)?;
        }
        if let Some(category_id) = &patch.category_id {
            check_category(category_id)?;
        }
        Ok(())
    }
}

fn check_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AMOUNT_INVALID.to_string());
    }
    Ok(())
}

fn check_category(category_id: &str) -> Result<(), String> {
    if category_id.trim().is_empty() {
        return Err(CATEGORY_REQUIRED.to_string());
    }
    Ok(())
}
