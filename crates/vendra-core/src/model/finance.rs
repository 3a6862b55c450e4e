// ── Money: ledger, cards, pockets, crew payroll, promotions ──

use serde_json::Value;

use super::NullableText;

entity! {
    /// A ledger line. Optional references are written as NULL when empty.
    pub struct Transaction in transactions as Transactions {
        pub date: String,
        pub description: String,
        pub amount: f64,
        /// `"Income"` or `"Expense"`.
        #[serde(rename = "type")]
        pub transaction_type: String,
        pub project_id: NullableText,
        pub category: String,
        pub method: String,
        pub pocket_id: NullableText,
        pub card_id: NullableText,
        pub printing_item_id: NullableText,
        pub vendor_signature: NullableText,
    }
    draft TransactionDraft;
    patch TransactionPatch;
}

entity! {
    pub struct Card in cards as Cards {
        pub card_holder_name: String,
        pub bank_name: String,
        pub card_type: String,
        pub last_four_digits: String,
        pub expiry_date: String,
        pub balance: f64,
        pub color_gradient: String,
    }
    draft CardDraft;
    patch CardPatch;
}

entity! {
    /// Earmarked balance: savings goal, locked deposit, shared budget.
    pub struct FinancialPocket in financial_pockets as FinancialPockets {
        pub name: String,
        pub description: String,
        pub icon: String,
        #[serde(rename = "type")]
        pub pocket_type: String,
        pub amount: f64,
        pub goal_amount: f64,
        pub lock_end_date: String,
        pub members: Vec<Value>,
        pub source_card_id: NullableText,
    }
    draft FinancialPocketDraft;
    patch FinancialPocketPatch;
}

entity! {
    /// What one crew member is owed for one project.
    pub struct TeamProjectPayment in team_project_payments as TeamProjectPayments {
        pub project_id: String,
        pub team_member_name: String,
        pub team_member_id: String,
        pub date: String,
        pub status: String,
        pub fee: f64,
        pub reward: f64,
    }
    draft TeamProjectPaymentDraft;
    patch TeamProjectPaymentPatch;
}

entity! {
    /// A payout slip bundling several project payments.
    pub struct TeamPaymentRecord in team_payment_records as TeamPaymentRecords {
        pub record_number: String,
        pub team_member_id: String,
        pub date: String,
        pub project_payment_ids: Vec<String>,
        pub total_amount: f64,
        pub vendor_signature: String,
    }
    draft TeamPaymentRecordDraft;
    patch TeamPaymentRecordPatch;
}

entity! {
    pub struct RewardLedgerEntry in reward_ledger_entries as RewardLedgerEntries {
        pub team_member_id: String,
        pub date: String,
        pub description: String,
        pub amount: f64,
        pub project_id: NullableText,
    }
    draft RewardLedgerEntryDraft;
    patch RewardLedgerEntryPatch;
}

entity! {
    pub struct PromoCode in promo_codes as PromoCodes {
        pub code: String,
        pub discount_type: String,
        pub discount_value: f64,
        pub is_active: bool,
        pub usage_count: i64,
        pub max_usage: Option<i64>,
        pub expiry_date: Option<String>,
    }
    server {
        pub created_at: String,
    }
    draft PromoCodeDraft;
    patch PromoCodePatch;
}
