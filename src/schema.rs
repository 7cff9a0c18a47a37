diesel::table! {
    checks (id) {
        id -> Int4,
        contract_id -> Int4,
        check_no -> Varchar,
        check_date -> Date,
        amount -> Numeric,
    }
}

diesel::table! {
    contracts (id) {
        id -> Int4,
        tenant_id -> Int4,
        property_name -> Varchar,
        location -> Varchar,
        start_date -> Date,
        expiry_date -> Date,
        annual_rent -> Numeric,
        num_checks -> Int2,
        payment_method -> Varchar,
        agent_name -> Varchar,
        agent_email -> Varchar,
    }
}

diesel::table! {
    tenants (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        phone -> Varchar,
    }
}

diesel::joinable!(checks -> contracts (contract_id));
diesel::joinable!(contracts -> tenants (tenant_id));

diesel::allow_tables_to_appear_in_same_query!(
    checks,
    contracts,
    tenants,
);
