table! {
    qrl_blockchain_blocks (block_number) {
        block_number -> BigInt,
        block_found -> Bool,
        block_result -> Nullable<Varchar>,
        block_size -> BigInt,
        block_found_datetime -> Nullable<Timestamptz>,
        block_found_timestamp_seconds -> BigInt,
        block_reward_block -> BigInt,
        block_reward_fee -> BigInt,
        block_mining_nonce -> BigInt,
        block_extra_nonce -> Nullable<Varchar>,
        block_number_of_transactions -> Nullable<BigInt>,
        block_hash_header_type -> Nullable<Varchar>,
        block_hash_header_data -> Nullable<Varchar>,
        block_hash_header_type_prev -> Nullable<Varchar>,
        block_hash_header_data_prev -> Nullable<Varchar>,
        block_merkle_root_type -> Nullable<Varchar>,
        block_merkle_root_data -> Nullable<Varchar>,
        spider_name -> Nullable<Varchar>,
        spider_version -> Nullable<Varchar>,
        block_added_timestamp -> Timestamptz,
        got_all_transactions -> Nullable<Bool>,
    }
}

table! {
    qrl_blockchain_transactions (transaction_hash, transaction_receiving_wallet_address) {
        transaction_hash -> Varchar,
        transaction_sending_wallet_address -> Varchar,
        transaction_receiving_wallet_address -> Varchar,
        transaction_amount_send -> BigInt,
        transaction_type -> Varchar,
        transaction_block_number -> BigInt,
        transaction_found -> Bool,
        transaction_result -> Nullable<Varchar>,
        spider_name -> Varchar,
        spider_version -> Varchar,
        master_addr_type -> Nullable<Varchar>,
        master_addr_data -> Nullable<Varchar>,
        master_addr_fee -> BigInt,
        public_key_type -> Nullable<Varchar>,
        public_key_data -> Nullable<Varchar>,
        signature_type -> Nullable<Varchar>,
        signature_data -> Nullable<Varchar>,
        transaction_nonce -> BigInt,
        transaction_addrs_to_type -> Nullable<Varchar>,
        block_found_datetime -> Timestamptz,
        transaction_added_datetime -> Timestamptz,
        token_symbol -> Nullable<Varchar>,
        token_name -> Nullable<Varchar>,
        token_owner -> Nullable<Varchar>,
        token_decimals -> Nullable<BigInt>,
    }
}

table! {
    qrl_wallet_address (wallet_address) {
        wallet_address -> Varchar,
        address_balance -> BigInt,
        address_nonce -> BigInt,
        address_ots_bitfield_used_page -> BigInt,
        address_used_ots_key_count -> BigInt,
        address_transaction_hash_count -> BigInt,
        address_tokens_count -> BigInt,
        address_slaves_count -> BigInt,
        address_lattice_pk_count -> BigInt,
        address_multi_sig_address_count -> BigInt,
        address_multi_sig_spend_count -> BigInt,
        address_inbox_message_count -> BigInt,
        address_foundation_multi_sig_spend_txn_hash -> Nullable<Text>,
        address_foundation_multi_sig_vote_txn_hash -> Nullable<Text>,
        address_unvotes -> Nullable<Text>,
        address_proposal_vote_stats -> Nullable<Text>,
        wallet_custom_name -> Nullable<Varchar>,
        wallet_type -> Nullable<Varchar>,
        address_first_found -> Nullable<Timestamptz>,
        address_first_found_block_num -> Nullable<BigInt>,
        address_added_datetime -> Timestamptz,
        spider_name -> Nullable<Varchar>,
        spider_version -> Nullable<Varchar>,
    }
}

table! {
    qrl_blockchain_missed_items (id) {
        id -> Int4,
        spider_name -> Varchar,
        spider_version -> Varchar,
        location_script_file -> Varchar,
        location_script_function -> Varchar,
        trace_back -> Nullable<Text>,
        error_type -> Varchar,
        error_name -> Varchar,
        item_url -> Varchar,
        error_timestamp -> Timestamptz,
        failed_data -> Nullable<Text>,
    }
}

table! {
    qrl_blockchain_emission (id) {
        id -> Int4,
        emission -> Varchar,
        updated_at -> Timestamptz,
    }
}

joinable!(qrl_blockchain_transactions -> qrl_blockchain_blocks (transaction_block_number));
allow_tables_to_appear_in_same_query!(qrl_blockchain_blocks, qrl_blockchain_transactions);
