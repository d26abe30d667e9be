pub mod lnurlmock;
