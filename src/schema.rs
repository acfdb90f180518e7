diesel::table! {
    accounts (id) {
        id -> Text,
        user_id -> Text,
        name -> Text,
        kind -> Text,
        balance -> Text,
        bank_name -> Nullable<Text>,
        ifsc -> Nullable<Text>,
        last_four -> Nullable<Text>,
        credit_card_limit -> Nullable<Text>,
        symbol -> Nullable<Text>,
        quantity -> Nullable<Text>,
        price_per_share -> Nullable<Text>,
        invested_amount -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    transactions (id) {
        id -> Text,
        user_id -> Text,
        account_kind -> Text,
        account_id -> Text,
        txn_type -> Text,
        amount -> Text,
        balance_after -> Text,
        category -> Text,
        subtype -> Nullable<Text>,
        payment_mode -> Nullable<Text>,
        description -> Nullable<Text>,
        sender_id -> Nullable<Text>,
        receiver_id -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    income_entries (id) {
        id -> Text,
        user_id -> Text,
        account_id -> Text,
        amount -> Text,
        category -> Text,
        source -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    transfers (id) {
        id -> Text,
        sender_user_id -> Text,
        receiver_user_id -> Text,
        sender_wallet_id -> Text,
        receiver_wallet_id -> Text,
        amount -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    budgets (id) {
        id -> Text,
        user_id -> Text,
        category -> Text,
        month -> Text,
        limit_amount -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    goals (id) {
        id -> Text,
        user_id -> Text,
        account_kind -> Text,
        account_id -> Nullable<Text>,
        name -> Text,
        target_amount -> Text,
        months_to_achieve -> Integer,
        monthly_savings -> Text,
        current_savings -> Text,
        status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    goal_contributions (id) {
        id -> Text,
        goal_id -> Text,
        amount -> Text,
        source -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    audit_logs (id) {
        id -> Text,
        actor -> Text,
        action -> Text,
        created_at -> Timestamp,
    }
}

diesel::joinable!(goal_contributions -> goals (goal_id));

diesel::allow_tables_to_appear_in_same_query!(
    accounts,
    transactions,
    income_entries,
    transfers,
    budgets,
    goals,
    goal_contributions,
    audit_logs,
);
